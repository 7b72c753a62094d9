use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::error::ConfigError;
use crate::domain::models::Severity;
use crate::domain::ports::RedactionRule;
use crate::services::color_theme::ColorScheme;
use crate::services::redaction::builtin_rules;
use crate::services::timestamp::{Timestamper, Zone, DEFAULT_TIME_FORMAT};

/// Primary sink used when no path is configured
pub const DEFAULT_LOG_FILE: &str = "./app.log";

/// Error sink used when no path is configured
pub const DEFAULT_ERROR_FILE: &str = "./app_error.log";

/// Size-triggered rotation of a file sink
///
/// A zero `max_age_days` or `max_backups` disables that pruning rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RotationPolicy {
    /// Size in megabytes that triggers a rotation
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    /// Delete backups older than this many days
    #[serde(default)]
    pub max_age_days: u32,

    /// Keep at most this many backups
    #[serde(default)]
    pub max_backups: usize,

    /// Gzip backups after rotation
    #[serde(default)]
    pub compress: bool,
}

const fn default_max_size_mb() -> u64 {
    100
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            max_age_days: 0,
            max_backups: 0,
            compress: false,
        }
    }
}

impl RotationPolicy {
    /// Rotation threshold in bytes
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

/// One named configuration step
///
/// Options are applied in order; a later option on the same field wins.
#[derive(Clone)]
pub enum LogOption {
    /// Minimum severity written
    Level(Severity),
    /// Emit one JSON object per line
    JsonFormat,
    /// Primary sink path; empty selects [`DEFAULT_LOG_FILE`]
    FileOutput(PathBuf),
    /// Error sink path; empty selects [`DEFAULT_ERROR_FILE`]
    ErrorOutput(PathBuf),
    /// Do not mirror errors to a dedicated sink
    NoErrorOutput,
    /// Also echo the primary stream to stderr
    Console,
    /// Attach the call site to every primary record
    AddSource,
    /// strftime pattern for timestamps
    TimeFormat(String),
    /// IANA zone name, or `"Local"`
    TimeZone(String),
    /// Rotate file sinks with this policy
    Rotation(RotationPolicy),
    /// Colorize messages, with the built-in scheme unless one is given
    Color,
    /// Colour scheme used when colour is on
    ColorScheme(ColorScheme),
    /// Enable redaction, adding these rules after the built-in ones
    Redaction(Vec<Arc<dyn RedactionRule>>),
}

impl fmt::Debug for LogOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => f.debug_tuple("Level").field(level).finish(),
            Self::JsonFormat => f.write_str("JsonFormat"),
            Self::FileOutput(path) => f.debug_tuple("FileOutput").field(path).finish(),
            Self::ErrorOutput(path) => f.debug_tuple("ErrorOutput").field(path).finish(),
            Self::NoErrorOutput => f.write_str("NoErrorOutput"),
            Self::Console => f.write_str("Console"),
            Self::AddSource => f.write_str("AddSource"),
            Self::TimeFormat(format) => f.debug_tuple("TimeFormat").field(format).finish(),
            Self::TimeZone(zone) => f.debug_tuple("TimeZone").field(zone).finish(),
            Self::Rotation(policy) => f.debug_tuple("Rotation").field(policy).finish(),
            Self::Color => f.write_str("Color"),
            Self::ColorScheme(scheme) => f.debug_tuple("ColorScheme").field(scheme).finish(),
            Self::Redaction(rules) => f.debug_tuple("Redaction").field(&rules.len()).finish(),
        }
    }
}

/// Frozen configuration handed to exactly one backend adapter
#[derive(Clone)]
pub struct LogConfig {
    pub min_severity: Severity,
    pub json_output: bool,
    pub primary_path: PathBuf,
    /// `None` when errors are not mirrored
    pub error_path: Option<PathBuf>,
    pub console: bool,
    pub add_call_site: bool,
    /// Zone and pattern used to stamp events
    pub timestamper: Timestamper,
    pub rotation: Option<RotationPolicy>,
    pub color_enabled: bool,
    pub color_scheme: Option<ColorScheme>,
    pub redaction_enabled: bool,
    /// Built-in rules first, then the caller's, in order
    pub redaction_rules: Vec<Arc<dyn RedactionRule>>,
}

impl LogConfig {
    /// Apply `options` to the defaults
    pub fn from_options(options: impl IntoIterator<Item = LogOption>) -> Result<Self, ConfigError> {
        ConfigBuilder::new().options(options).build()
    }

    /// Render the message text, coloured when colour is on
    pub fn colorize(&self, severity: Severity, message: &str) -> String {
        match (&self.color_scheme, self.color_enabled) {
            (Some(scheme), true) => scheme.colorize(severity, message),
            _ => message.to_string(),
        }
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("min_severity", &self.min_severity)
            .field("json_output", &self.json_output)
            .field("primary_path", &self.primary_path)
            .field("error_path", &self.error_path)
            .field("console", &self.console)
            .field("add_call_site", &self.add_call_site)
            .field("timestamper", &self.timestamper)
            .field("rotation", &self.rotation)
            .field("color_enabled", &self.color_enabled)
            .field("redaction_rules", &self.redaction_rules.len())
            .finish_non_exhaustive()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            json_output: false,
            primary_path: PathBuf::from(DEFAULT_LOG_FILE),
            error_path: Some(PathBuf::from(DEFAULT_ERROR_FILE)),
            console: false,
            add_call_site: false,
            timestamper: Timestamper::local_default(),
            rotation: None,
            color_enabled: false,
            color_scheme: None,
            redaction_enabled: false,
            redaction_rules: Vec::new(),
        }
    }
}

#[derive(Default)]
enum ErrorSink {
    #[default]
    Default,
    Path(PathBuf),
    Disabled,
}

/// Mutable draft the options are applied to
#[derive(Default)]
struct Draft {
    level: Option<Severity>,
    json_output: bool,
    primary_path: Option<PathBuf>,
    error_sink: ErrorSink,
    console: bool,
    add_call_site: bool,
    time_format: Option<String>,
    time_zone: Option<String>,
    rotation: Option<RotationPolicy>,
    color_enabled: bool,
    color_scheme: Option<ColorScheme>,
    extra_rules: Option<Vec<Arc<dyn RedactionRule>>>,
}

/// Applies [`LogOption`]s in order and fills in defaults
///
/// # Examples
///
/// ```
/// use polylog::{ConfigBuilder, LogOption, Severity};
///
/// let config = ConfigBuilder::new()
///     .option(LogOption::Level(Severity::Debug))
///     .option(LogOption::Level(Severity::Warn))
///     .option(LogOption::Color)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.min_severity, Severity::Warn);
/// assert!(config.color_scheme.is_some());
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    draft: Draft,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one option
    #[must_use]
    pub fn option(mut self, option: LogOption) -> Self {
        self.apply(option);
        self
    }

    /// Apply options in iteration order
    #[must_use]
    pub fn options(mut self, options: impl IntoIterator<Item = LogOption>) -> Self {
        for option in options {
            self.apply(option);
        }
        self
    }

    fn apply(&mut self, option: LogOption) {
        let draft = &mut self.draft;
        match option {
            LogOption::Level(level) => draft.level = Some(level),
            LogOption::JsonFormat => draft.json_output = true,
            LogOption::FileOutput(path) => {
                draft.primary_path = (!path.as_os_str().is_empty()).then_some(path);
            }
            LogOption::ErrorOutput(path) if path.as_os_str().is_empty() => {
                draft.error_sink = ErrorSink::Default;
            }
            LogOption::ErrorOutput(path) => draft.error_sink = ErrorSink::Path(path),
            LogOption::NoErrorOutput => draft.error_sink = ErrorSink::Disabled,
            LogOption::Console => draft.console = true,
            LogOption::AddSource => draft.add_call_site = true,
            LogOption::TimeFormat(format) => draft.time_format = Some(format),
            LogOption::TimeZone(zone) => draft.time_zone = Some(zone),
            LogOption::Rotation(policy) => draft.rotation = Some(policy),
            LogOption::Color => draft.color_enabled = true,
            LogOption::ColorScheme(scheme) => draft.color_scheme = Some(scheme),
            LogOption::Redaction(rules) => draft.extra_rules = Some(rules),
        }
    }

    /// Freeze the draft
    ///
    /// Fails on an unknown time zone or a pattern chrono cannot render.
    pub fn build(self) -> Result<LogConfig, ConfigError> {
        let draft = self.draft;

        let zone = Zone::resolve(draft.time_zone.as_deref().unwrap_or_default())?;
        let format = draft
            .time_format
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
        let timestamper = Timestamper::new(zone, format)?;

        let error_path = match draft.error_sink {
            ErrorSink::Default => Some(PathBuf::from(DEFAULT_ERROR_FILE)),
            ErrorSink::Path(path) => Some(path),
            ErrorSink::Disabled => None,
        };

        let color_scheme = match (draft.color_enabled, draft.color_scheme) {
            (true, None) => Some(ColorScheme::builtin()),
            (_, scheme) => scheme,
        };

        let redaction_enabled = draft.extra_rules.is_some();
        let redaction_rules = draft
            .extra_rules
            .map(|extra| builtin_rules().into_iter().chain(extra).collect())
            .unwrap_or_default();

        Ok(LogConfig {
            min_severity: draft.level.unwrap_or_default(),
            json_output: draft.json_output,
            primary_path: draft
                .primary_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            error_path,
            console: draft.console,
            add_call_site: draft.add_call_site,
            timestamper,
            rotation: draft.rotation,
            color_enabled: draft.color_enabled,
            color_scheme,
            redaction_enabled,
            redaction_rules,
        })
    }
}
