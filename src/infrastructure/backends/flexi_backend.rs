use flexi_logger::writers::LogWriter;
use flexi_logger::{DeferredNow, LogSpecification, LoggerHandle};
use log::{LevelFilter, Log, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;

use super::{exit_if_fatal, log_line, open_sinks};
use crate::domain::error::ConfigError;
use crate::domain::models::{CallSite, LogEvent, Severity};
use crate::domain::ports::{LevelMapping, LogBackend};
use crate::infrastructure::config::LogConfig;
use crate::infrastructure::logging::{render, EventPipeline, SharedSink};

/// Severity mapping onto flexi_logger level filters
pub struct FlexiLevels;

impl LevelMapping for FlexiLevels {
    type Level = LevelFilter;

    fn to_backend(severity: Severity) -> LevelFilter {
        match severity {
            Severity::Debug => LevelFilter::Debug,
            Severity::Info => LevelFilter::Info,
            Severity::Warn => LevelFilter::Warn,
            Severity::Error | Severity::Fatal => LevelFilter::Error,
        }
    }

    fn from_backend(level: LevelFilter) -> Severity {
        match level {
            LevelFilter::Debug => Severity::Debug,
            LevelFilter::Warn => Severity::Warn,
            LevelFilter::Error => Severity::Error,
            LevelFilter::Off | LevelFilter::Info | LevelFilter::Trace => Severity::Info,
        }
    }
}

fn spec(severity: Severity) -> LogSpecification {
    LogSpecification::builder()
        .default(FlexiLevels::to_backend(severity))
        .build()
}

/// Writer handing already rendered lines to a [`SharedSink`]
struct SinkLogWriter {
    sink: SharedSink,
}

impl LogWriter for SinkLogWriter {
    fn write(&self, _now: &mut DeferredNow, record: &Record) -> io::Result<()> {
        self.sink.write_line(&record.args().to_string());
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.sink.flush();
        Ok(())
    }
}

fn engine(sink: SharedSink, spec: LogSpecification) -> Result<(Box<dyn Log>, LoggerHandle), ConfigError> {
    flexi_logger::Logger::with(spec)
        .log_to_writer(Box::new(SinkLogWriter { sink }))
        .build()
        .map_err(|e| ConfigError::engine("flexi_logger", e))
}

struct Engine {
    logger: Box<dyn Log>,
    handle: LoggerHandle,
    sink: SharedSink,
}

impl Engine {
    fn write(&self, line: &str, severity: Severity, call_site: Option<CallSite>) {
        let level = FlexiLevels::to_backend(severity)
            .to_level()
            .unwrap_or(log::Level::Info);
        log_line(self.logger.as_ref(), level, line, call_site);
    }

    fn flush(&self) {
        self.handle.flush();
        self.sink.flush();
    }
}

struct Engines {
    primary: Engine,
    error: Option<Engine>,
}

/// Adapter over loggers built with `flexi_logger::Logger::build`
///
/// The loggers are never started, so nothing is installed process-wide.
/// Derived views inherit every setting.
#[derive(Clone)]
pub struct FlexiBackend {
    pipeline: EventPipeline,
    engines: Arc<Engines>,
}

impl FlexiBackend {
    /// Build the adapter, one flexi_logger instance per sink
    pub fn new(config: LogConfig) -> Result<Self, ConfigError> {
        let (primary_sink, error_sink) = open_sinks(&config)?;

        let (logger, handle) = engine(primary_sink.clone(), spec(config.min_severity))?;
        let primary = Engine {
            logger,
            handle,
            sink: primary_sink,
        };
        let error = match error_sink {
            Some(sink) => {
                let (logger, handle) = engine(sink.clone(), spec(Severity::Error))?;
                Some(Engine { logger, handle, sink })
            }
            None => None,
        };

        debug!(
            backend = "flexi",
            level = %config.min_severity,
            path = %config.primary_path.display(),
            json = config.json_output,
            "logger constructed"
        );

        Ok(Self {
            pipeline: EventPipeline::new(config),
            engines: Arc::new(Engines { primary, error }),
        })
    }
}

impl LogBackend for FlexiBackend {
    fn log(&self, event: LogEvent) {
        let severity = event.severity;
        if let Some(prepared) = self.pipeline.prepare(event) {
            let json = self.pipeline.config().json_output;
            let line = render::line(&prepared, prepared.primary_call_site, json);
            self.engines
                .primary
                .write(&line, severity, prepared.primary_call_site);

            if prepared.is_mirrored() {
                if let Some(error) = &self.engines.error {
                    let line = render::line(&prepared, prepared.mirror_call_site, json);
                    error.write(&line, severity, prepared.mirror_call_site);
                }
            }
        }
        exit_if_fatal(severity, || self.flush());
    }

    fn set_level(&self, level: Severity) {
        self.pipeline.set_level(level);
        self.engines.primary.handle.set_new_spec(spec(level));
    }

    fn level(&self) -> Severity {
        self.pipeline.level()
    }

    fn supports_runtime_level_change(&self) -> bool {
        true
    }

    fn with_fields(&self, fields: HashMap<String, Value>) -> Self {
        Self {
            pipeline: self.pipeline.derive(fields, true),
            engines: Arc::clone(&self.engines),
        }
    }

    fn flush(&self) {
        self.engines.primary.flush();
        if let Some(error) = &self.engines.error {
            error.flush();
        }
    }
}
