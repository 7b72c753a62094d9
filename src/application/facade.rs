use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::process;
use tracing::debug;

use crate::domain::error::ConfigError;
use crate::domain::models::{BackendKind, LogEvent, Severity};
use crate::domain::ports::LogBackend;
use crate::infrastructure::backends::{EnvLoggerBackend, FlexiBackend, Log4rsBackend, TracingBackend};
use crate::infrastructure::config::{LogConfig, LogOption, LogSettings};

/// Build the flattened key/value argument list for a log call
///
/// Each expression is converted with `serde_json`; values that fail to
/// serialize become `null`.
///
/// ```
/// use polylog::{args, Value};
///
/// let list = args!["user", "bob", "attempts", 3];
/// assert_eq!(list, vec![Value::from("user"), Value::from("bob"), Value::from("attempts"), Value::from(3)]);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::__value(&$value)),+]
    };
}

#[doc(hidden)]
pub fn __value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

macro_rules! each_backend {
    ($logger:expr, $backend:ident => $body:expr) => {
        match $logger {
            Logger::Tracing($backend) => $body,
            Logger::Log4rs($backend) => $body,
            Logger::Flexi($backend) => $body,
            Logger::EnvLogger($backend) => $body,
        }
    };
}

/// The logging facade
///
/// One variant per backend engine. Every logging method resolves the call
/// site of its caller, builds a [`LogEvent`] and hands it to the selected
/// adapter. Cloning is cheap: clones share engines, sinks and threshold.
///
/// # Examples
///
/// ```
/// use polylog::{args, BackendKind, Logger, LogOption, Severity};
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = Logger::with_kind(
///     BackendKind::Flexi,
///     [
///         LogOption::FileOutput(dir.path().join("app.log")),
///         LogOption::ErrorOutput(dir.path().join("app_error.log")),
///         LogOption::Level(Severity::Debug),
///     ],
/// )
/// .unwrap();
///
/// logger.info("server listening", args!["port", 8080]);
/// logger.error("upstream unavailable", args!["host", "db-1"]);
/// logger.flush();
///
/// let errors = std::fs::read_to_string(dir.path().join("app_error.log")).unwrap();
/// assert!(errors.contains("upstream unavailable host=db-1"));
/// ```
#[derive(Clone)]
pub enum Logger {
    /// `tracing-subscriber` engine
    Tracing(TracingBackend),
    /// `log4rs` engine, fixed threshold
    Log4rs(Log4rsBackend),
    /// `flexi_logger` engine
    Flexi(FlexiBackend),
    /// `env_logger` engine, text only
    EnvLogger(EnvLoggerBackend),
}

impl Logger {
    /// Build a logger of the default kind from `options`
    pub fn new(options: impl IntoIterator<Item = LogOption>) -> Result<Self, ConfigError> {
        Self::with_kind(BackendKind::default(), options)
    }

    /// Build a logger of `kind` from `options`
    pub fn with_kind(
        kind: BackendKind,
        options: impl IntoIterator<Item = LogOption>,
    ) -> Result<Self, ConfigError> {
        Self::with_config(kind, LogConfig::from_options(options)?)
    }

    /// Build a logger of `kind` from a finished configuration
    pub fn with_config(kind: BackendKind, config: LogConfig) -> Result<Self, ConfigError> {
        debug!(backend = %kind, "building logger");
        Ok(match kind {
            BackendKind::Tracing => Self::Tracing(TracingBackend::new(config)?),
            BackendKind::Log4rs => Self::Log4rs(Log4rsBackend::new(config)?),
            BackendKind::Flexi => Self::Flexi(FlexiBackend::new(config)?),
            BackendKind::EnvLogger => Self::EnvLogger(EnvLoggerBackend::new(config)?),
        })
    }

    /// Default kind, `Info` threshold, default paths, call sites on
    pub fn default_logger() -> Result<Self, ConfigError> {
        Self::new([LogOption::AddSource])
    }

    /// Build the logger described by loaded settings
    pub fn from_settings(settings: &LogSettings) -> Result<Self, ConfigError> {
        let (kind, options) = settings.to_options()?;
        Self::with_kind(kind, options)
    }

    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Tracing(_) => BackendKind::Tracing,
            Self::Log4rs(_) => BackendKind::Log4rs,
            Self::Flexi(_) => BackendKind::Flexi,
            Self::EnvLogger(_) => BackendKind::EnvLogger,
        }
    }

    /// The selected adapter behind the port trait
    pub fn backend(&self) -> &dyn LogBackend {
        each_backend!(self, backend => backend as &dyn LogBackend)
    }

    #[track_caller]
    fn emit(&self, severity: Severity, message: String, args: Vec<Value>) {
        self.backend().log(LogEvent::new(severity, message, args));
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, args: impl Into<Vec<Value>>) {
        self.emit(Severity::Debug, message.into(), args.into());
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, args: impl Into<Vec<Value>>) {
        self.emit(Severity::Info, message.into(), args.into());
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, args: impl Into<Vec<Value>>) {
        self.emit(Severity::Warn, message.into(), args.into());
    }

    /// Log at `Error`; also written to the error sink
    #[track_caller]
    pub fn error(&self, message: impl Into<String>, args: impl Into<Vec<Value>>) {
        self.emit(Severity::Error, message.into(), args.into());
    }

    /// Log at `Fatal`, flush both sinks and exit with status 1
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>, args: impl Into<Vec<Value>>) -> ! {
        self.emit(Severity::Fatal, message.into(), args.into());
        process::exit(1)
    }

    #[track_caller]
    pub fn debugf(&self, message: fmt::Arguments<'_>) {
        self.emit(Severity::Debug, message.to_string(), Vec::new());
    }

    #[track_caller]
    pub fn infof(&self, message: fmt::Arguments<'_>) {
        self.emit(Severity::Info, message.to_string(), Vec::new());
    }

    #[track_caller]
    pub fn warnf(&self, message: fmt::Arguments<'_>) {
        self.emit(Severity::Warn, message.to_string(), Vec::new());
    }

    #[track_caller]
    pub fn errorf(&self, message: fmt::Arguments<'_>) {
        self.emit(Severity::Error, message.to_string(), Vec::new());
    }

    #[track_caller]
    pub fn fatalf(&self, message: fmt::Arguments<'_>) -> ! {
        self.emit(Severity::Fatal, message.to_string(), Vec::new());
        process::exit(1)
    }

    /// Change the threshold; see [`Logger::supports_runtime_level_change`]
    pub fn set_level(&self, level: Severity) {
        self.backend().set_level(level);
    }

    pub fn level(&self) -> Severity {
        self.backend().level()
    }

    pub fn supports_runtime_level_change(&self) -> bool {
        self.backend().supports_runtime_level_change()
    }

    /// Derive a logger that attaches `fields` to every event
    #[must_use]
    pub fn with_fields(&self, fields: HashMap<String, Value>) -> Self {
        match self {
            Self::Tracing(backend) => Self::Tracing(backend.with_fields(fields)),
            Self::Log4rs(backend) => Self::Log4rs(backend.with_fields(fields)),
            Self::Flexi(backend) => Self::Flexi(backend.with_fields(fields)),
            Self::EnvLogger(backend) => Self::EnvLogger(backend.with_fields(fields)),
        }
    }

    pub fn flush(&self) {
        self.backend().flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("kind", &self.kind())
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn logger(kind: BackendKind, dir: &TempDir, extra: impl IntoIterator<Item = LogOption>) -> Logger {
        let mut options = vec![
            LogOption::FileOutput(dir.path().join("app.log")),
            LogOption::ErrorOutput(dir.path().join("app_error.log")),
        ];
        options.extend(extra);
        Logger::with_kind(kind, options).unwrap()
    }

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap_or_default()
    }

    #[test]
    fn test_args_macro() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
        }

        assert_eq!(
            args!["point", Point { x: 2 }, "ok", true],
            vec![json!("point"), json!({"x": 2}), json!("ok"), json!(true)]
        );
        assert_eq!(args![1,], vec![json!(1)]);
    }

    #[test]
    fn test_kind_matches_variant() {
        let dir = TempDir::new().unwrap();
        for kind in BackendKind::ALL {
            assert_eq!(logger(kind, &dir, []).kind(), kind);
        }
    }

    #[test]
    fn test_call_site_is_the_caller() {
        let dir = TempDir::new().unwrap();
        let logger = logger(BackendKind::Flexi, &dir, []);

        let line = line!() + 1;
        logger.error("lost connection", args![]);
        logger.flush();

        let errors = read(&dir, "app_error.log");
        assert!(errors.contains(&format!("[facade.rs:{line}] lost connection")));
    }

    #[test]
    fn test_formatted_variants() {
        let dir = TempDir::new().unwrap();
        let logger = logger(BackendKind::EnvLogger, &dir, [LogOption::Level(Severity::Debug)]);

        logger.debugf(format_args!("retry {} of {}", 2, 5));
        logger.warnf(format_args!("queue at {}%", 80));
        logger.flush();

        let primary = read(&dir, "app.log");
        assert!(primary.contains("DEBUG retry 2 of 5"));
        assert!(primary.contains("WARN  queue at 80%"));
    }

    #[test]
    fn test_slices_and_arrays_are_accepted() {
        let dir = TempDir::new().unwrap();
        let logger = logger(BackendKind::Log4rs, &dir, []);

        logger.info("from slice", &[json!("a"), json!(1)][..]);
        logger.info("from array", [json!("b"), json!(2)]);
        logger.flush();

        let primary = read(&dir, "app.log");
        assert!(primary.contains("from slice a=1"));
        assert!(primary.contains("from array b=2"));
    }

    #[test]
    fn test_clones_share_threshold() {
        let dir = TempDir::new().unwrap();
        let logger = logger(BackendKind::Tracing, &dir, []);
        let clone = logger.clone();

        clone.set_level(Severity::Error);
        assert_eq!(logger.level(), Severity::Error);
        assert!(format!("{logger:?}").contains("Tracing"));
    }
}
