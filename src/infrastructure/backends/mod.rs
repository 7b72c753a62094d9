//! Backend adapters, one per external logging engine
//!
//! Every adapter runs the shared [`EventPipeline`] and then writes the
//! prepared event to a primary engine instance and, for `Error` and
//! `Fatal`, to a second instance bound to the error sink. No adapter
//! installs anything process-wide.

pub mod env_backend;
pub mod flexi_backend;
pub mod log4rs_backend;
pub mod tracing_backend;

pub use env_backend::{EnvLoggerBackend, EnvLoggerLevels};
pub use flexi_backend::{FlexiBackend, FlexiLevels};
pub use log4rs_backend::{Log4rsBackend, Log4rsLevels};
pub use tracing_backend::{TracingBackend, TracingLevels};

use log::{Log, Record};
use std::process;

use crate::domain::error::ConfigError;
use crate::domain::models::{CallSite, Severity};
use crate::infrastructure::config::LogConfig;
use crate::infrastructure::logging::SharedSink;

/// Target attached to every record handed to an engine
pub const EVENT_TARGET: &str = "polylog";

/// Open the primary sink and, when configured, the error sink
pub(crate) fn open_sinks(config: &LogConfig) -> Result<(SharedSink, Option<SharedSink>), ConfigError> {
    let primary =
        SharedSink::open(&config.primary_path, config.rotation)?.with_stderr_echo(config.console);
    let error = config
        .error_path
        .as_deref()
        .map(|path| SharedSink::open(path, config.rotation))
        .transpose()?;
    Ok((primary, error))
}

/// Hand one preformatted line to a `log` engine
pub(crate) fn log_line(engine: &dyn Log, level: log::Level, line: &str, call_site: Option<CallSite>) {
    engine.log(
        &Record::builder()
            .args(format_args!("{line}"))
            .level(level)
            .target(EVENT_TARGET)
            .file_static(call_site.map(|site| site.file))
            .line(call_site.map(|site| site.line))
            .build(),
    );
}

/// Terminate after a fatal event, once `flush` has run
pub(crate) fn exit_if_fatal(severity: Severity, flush: impl FnOnce()) {
    if severity == Severity::Fatal {
        flush();
        process::exit(1);
    }
}
