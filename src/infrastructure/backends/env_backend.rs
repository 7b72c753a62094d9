use env_logger::Target;
use log::{Level, LevelFilter};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use super::{exit_if_fatal, log_line, open_sinks};
use crate::domain::error::ConfigError;
use crate::domain::models::{LogEvent, Severity};
use crate::domain::ports::{LevelMapping, LogBackend};
use crate::infrastructure::config::LogConfig;
use crate::infrastructure::logging::{render, EventPipeline, SharedSink};

/// Severity mapping onto env_logger levels
///
/// `Debug` maps to the engine's most verbose tier.
pub struct EnvLoggerLevels;

impl LevelMapping for EnvLoggerLevels {
    type Level = Level;

    fn to_backend(severity: Severity) -> Level {
        match severity {
            Severity::Debug => Level::Trace,
            Severity::Info => Level::Info,
            Severity::Warn => Level::Warn,
            Severity::Error | Severity::Fatal => Level::Error,
        }
    }

    fn from_backend(level: Level) -> Severity {
        match level {
            Level::Trace => Severity::Debug,
            Level::Warn => Severity::Warn,
            Level::Error => Severity::Error,
            Level::Info | Level::Debug => Severity::Info,
        }
    }
}

fn engine(sink: SharedSink, filter: LevelFilter) -> env_logger::Logger {
    env_logger::Builder::new()
        .target(Target::Pipe(Box::new(sink)))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter_level(filter)
        .build()
}

struct Engines {
    primary: env_logger::Logger,
    primary_sink: SharedSink,
    error: Option<(env_logger::Logger, SharedSink)>,
}

/// Adapter over per-instance `env_logger` loggers
///
/// The environment is never consulted and the engine filter stays at
/// `Trace`; the adapter owns the threshold. Output is always plain text,
/// with the call site inline when one applies.
#[derive(Clone)]
pub struct EnvLoggerBackend {
    pipeline: EventPipeline,
    engines: Arc<Engines>,
}

impl EnvLoggerBackend {
    /// Build the adapter, one env_logger instance per sink
    pub fn new(config: LogConfig) -> Result<Self, ConfigError> {
        let (primary_sink, error_sink) = open_sinks(&config)?;
        let primary = engine(primary_sink.clone(), LevelFilter::Trace);
        let error = error_sink.map(|sink| (engine(sink.clone(), LevelFilter::Error), sink));

        if config.json_output {
            debug!(backend = "env_logger", "JSON output not available, writing text");
        }
        debug!(
            backend = "env_logger",
            level = %config.min_severity,
            path = %config.primary_path.display(),
            "logger constructed"
        );

        Ok(Self {
            pipeline: EventPipeline::new(config),
            engines: Arc::new(Engines {
                primary,
                primary_sink,
                error,
            }),
        })
    }
}

impl LogBackend for EnvLoggerBackend {
    fn log(&self, event: LogEvent) {
        let severity = event.severity;
        let level = EnvLoggerLevels::to_backend(severity);
        if let Some(prepared) = self.pipeline.prepare(event) {
            let line = render::text_line(&prepared, prepared.primary_call_site);
            log_line(&self.engines.primary, level, &line, prepared.primary_call_site);

            if prepared.is_mirrored() {
                if let Some((engine, _)) = &self.engines.error {
                    let line = render::text_line(&prepared, prepared.mirror_call_site);
                    log_line(engine, level, &line, prepared.mirror_call_site);
                }
            }
        }
        exit_if_fatal(severity, || self.flush());
    }

    fn set_level(&self, level: Severity) {
        self.pipeline.set_level(level);
    }

    fn level(&self) -> Severity {
        self.pipeline.level()
    }

    fn supports_runtime_level_change(&self) -> bool {
        true
    }

    fn with_fields(&self, fields: HashMap<String, Value>) -> Self {
        Self {
            pipeline: self.pipeline.derive(fields, false),
            engines: Arc::clone(&self.engines),
        }
    }

    fn flush(&self) {
        self.engines.primary_sink.flush();
        if let Some((_, sink)) = &self.engines.error {
            sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CallSite;
    use crate::infrastructure::backends::test_support::{config, event, read};
    use crate::infrastructure::config::LogOption;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_debug_maps_to_trace() {
        assert_eq!(EnvLoggerLevels::to_backend(Severity::Debug), Level::Trace);
        assert_eq!(EnvLoggerLevels::from_backend(Level::Trace), Severity::Debug);
        assert_eq!(EnvLoggerLevels::from_backend(Level::Debug), Severity::Info);

        let mapped: Vec<Level> = Severity::ALL.iter().map(|s| EnvLoggerLevels::to_backend(*s)).collect();
        assert!(mapped.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_writes_text_even_when_json_requested() {
        let dir = TempDir::new().unwrap();
        let backend = EnvLoggerBackend::new(config(&dir, [LogOption::JsonFormat])).unwrap();

        backend.log(event(Severity::Info, "plain text", vec![json!("k"), json!("v")]));
        backend.flush();

        let primary = read(dir.path().join("app.log"));
        assert!(primary.contains("INFO  plain text k=v"));
        assert!(serde_json::from_str::<Value>(primary.trim()).is_err());
    }

    #[test]
    fn test_debug_passes_engine_filter() {
        let dir = TempDir::new().unwrap();
        let backend = EnvLoggerBackend::new(config(&dir, [LogOption::Level(Severity::Debug)])).unwrap();

        backend.log(event(Severity::Debug, "verbose detail", vec![]));
        backend.flush();

        assert!(read(dir.path().join("app.log")).contains("DEBUG verbose detail"));
    }

    #[test]
    fn test_mirror_and_derived_fields() {
        let dir = TempDir::new().unwrap();
        let backend = EnvLoggerBackend::new(config(&dir, [LogOption::AddSource])).unwrap();
        let derived = backend.with_fields(HashMap::from([("peer".to_string(), json!("10.0.0.2"))]));

        derived.log(event(Severity::Error, "handshake failed", vec![]).with_call_site(CallSite {
            file: "src/tls.rs",
            line: 19,
        }));
        backend.flush();

        let primary = read(dir.path().join("app.log"));
        let errors = read(dir.path().join("app_error.log"));
        // derived views drop the primary call site
        assert!(primary.contains("ERROR handshake failed peer=10.0.0.2"));
        assert!(errors.contains("[tls.rs:19] handshake failed peer=10.0.0.2"));
    }
}
