use log::{Level, LevelFilter, Record};
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::writer::simple::SimpleWriter;
use log4rs::encode::Encode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{exit_if_fatal, log_line, open_sinks};
use crate::domain::error::ConfigError;
use crate::domain::models::{CallSite, LogEvent, Severity};
use crate::domain::ports::{LevelMapping, LogBackend};
use crate::infrastructure::config::LogConfig;
use crate::infrastructure::logging::{render, EventPipeline, SharedSink};

/// Severity mapping onto `log` levels as used by log4rs
pub struct Log4rsLevels;

impl LevelMapping for Log4rsLevels {
    type Level = Level;

    fn to_backend(severity: Severity) -> Level {
        match severity {
            Severity::Debug => Level::Debug,
            Severity::Info => Level::Info,
            Severity::Warn => Level::Warn,
            Severity::Error | Severity::Fatal => Level::Error,
        }
    }

    fn from_backend(level: Level) -> Severity {
        match level {
            Level::Debug => Severity::Debug,
            Level::Warn => Severity::Warn,
            Level::Error => Severity::Error,
            Level::Info | Level::Trace => Severity::Info,
        }
    }
}

/// Appender writing encoded records to a [`SharedSink`]
#[derive(Debug)]
struct SinkAppender {
    sink: SharedSink,
    encoder: PatternEncoder,
}

impl SinkAppender {
    fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            encoder: PatternEncoder::new("{m}{n}"),
        }
    }
}

impl Append for SinkAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let mut buf = Vec::new();
        self.encoder.encode(&mut SimpleWriter(&mut buf), record)?;
        self.sink.write_line(&String::from_utf8_lossy(&buf));
        Ok(())
    }

    fn flush(&self) {
        self.sink.flush();
    }
}

fn engine(name: &str, sink: SharedSink, level: LevelFilter) -> Result<log4rs::Logger, ConfigError> {
    let config = Config::builder()
        .appender(Appender::builder().build(name, Box::new(SinkAppender::new(sink))))
        .build(Root::builder().appender(name).build(level))
        .map_err(|e| ConfigError::engine("log4rs", e))?;
    Ok(log4rs::Logger::new(config))
}

fn write(engine: &log4rs::Logger, line: &str, severity: Severity, call_site: Option<CallSite>) {
    log_line(engine, Log4rsLevels::to_backend(severity), line, call_site);
}

struct Engines {
    primary: log4rs::Logger,
    primary_sink: SharedSink,
    error: Option<(log4rs::Logger, SharedSink)>,
}

/// Adapter over per-instance `log4rs` loggers
///
/// The engine configuration is immutable once built, so the threshold is
/// fixed for the adapter's lifetime. Derived views keep the field set and
/// redaction only.
#[derive(Clone)]
pub struct Log4rsBackend {
    pipeline: EventPipeline,
    engines: Arc<Engines>,
}

impl Log4rsBackend {
    /// Build the adapter with one engine per sink
    pub fn new(config: LogConfig) -> Result<Self, ConfigError> {
        let (primary_sink, error_sink) = open_sinks(&config)?;
        let level = Log4rsLevels::to_backend(config.min_severity).to_level_filter();

        let primary = engine("primary", primary_sink.clone(), level)?;
        let error = error_sink
            .map(|sink| Ok::<_, ConfigError>((engine("error", sink.clone(), LevelFilter::Error)?, sink)))
            .transpose()?;

        debug!(
            backend = "log4rs",
            level = %config.min_severity,
            path = %config.primary_path.display(),
            json = config.json_output,
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

impl LogBackend for Log4rsBackend {
    fn log(&self, event: LogEvent) {
        let severity = event.severity;
        if let Some(prepared) = self.pipeline.prepare(event) {
            let json = self.pipeline.config().json_output;
            let line = render::line(&prepared, prepared.primary_call_site, json);
            write(&self.engines.primary, &line, severity, prepared.primary_call_site);

            if prepared.is_mirrored() {
                if let Some((engine, _)) = &self.engines.error {
                    let line = render::line(&prepared, prepared.mirror_call_site, json);
                    write(engine, &line, severity, prepared.mirror_call_site);
                }
            }
        }
        exit_if_fatal(severity, || self.flush());
    }

    fn set_level(&self, level: Severity) {
        debug!(requested = %level, "log4rs configuration is immutable, level unchanged");
    }

    fn level(&self) -> Severity {
        self.pipeline.level()
    }

    fn supports_runtime_level_change(&self) -> bool {
        false
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
    use crate::infrastructure::backends::test_support::{config, event, read};
    use crate::infrastructure::config::LogOption;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_level_mapping_is_monotonic() {
        let mapped: Vec<Level> = Severity::ALL.iter().map(|s| Log4rsLevels::to_backend(*s)).collect();
        // log orders levels by verbosity, so severity order is the reverse
        assert!(mapped.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_unmapped_level_falls_back_to_info() {
        assert_eq!(Log4rsLevels::from_backend(Level::Trace), Severity::Info);
        assert_eq!(Log4rsLevels::from_backend(Level::Error), Severity::Error);
    }

    #[test]
    fn test_set_level_is_ignored() {
        let dir = TempDir::new().unwrap();
        let backend = Log4rsBackend::new(config(&dir, [LogOption::Level(Severity::Warn)])).unwrap();

        backend.set_level(Severity::Debug);
        backend.log(event(Severity::Info, "still filtered", vec![]));
        backend.flush();

        assert_eq!(backend.level(), Severity::Warn);
        assert!(!backend.supports_runtime_level_change());
        assert!(!read(dir.path().join("app.log")).contains("still filtered"));
    }

    #[test]
    fn test_mirrors_errors_with_call_site() {
        let dir = TempDir::new().unwrap();
        let backend = Log4rsBackend::new(config(&dir, [])).unwrap();

        backend.log(
            event(Severity::Error, "payment declined", vec![json!("order"), json!(42)]).with_call_site(
                CallSite {
                    file: "src/billing.rs",
                    line: 7,
                },
            ),
        );
        backend.flush();

        let primary = read(dir.path().join("app.log"));
        let errors = read(dir.path().join("app_error.log"));
        assert!(primary.contains("ERROR payment declined order=42"));
        assert!(!primary.contains("billing.rs"));
        assert!(errors.contains("[billing.rs:7] payment declined order=42"));
    }

    #[test]
    fn test_derived_view_drops_color() {
        let dir = TempDir::new().unwrap();
        let backend = Log4rsBackend::new(config(&dir, [LogOption::Color])).unwrap();
        let derived = backend.with_fields(HashMap::from([("job".to_string(), json!("nightly"))]));

        derived.log(event(Severity::Info, "derived line", vec![]));
        backend.flush();

        let primary = read(dir.path().join("app.log"));
        assert!(primary.contains("INFO  derived line job=nightly"));
    }

    #[test]
    fn test_json_output() {
        let dir = TempDir::new().unwrap();
        let backend = Log4rsBackend::new(config(&dir, [LogOption::JsonFormat])).unwrap();

        backend.log(event(Severity::Warn, "slow query", vec![json!("ms"), json!(812)]));
        backend.flush();

        let primary = read(dir.path().join("app.log"));
        let line: Value = serde_json::from_str(primary.lines().next().unwrap()).unwrap();
        assert_eq!(line["msg"], "slow query");
        assert_eq!(line["ms"], 812);
    }
}
