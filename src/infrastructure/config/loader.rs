use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::builder::{LogOption, RotationPolicy, DEFAULT_ERROR_FILE, DEFAULT_LOG_FILE};
use crate::domain::error::ConfigError;
use crate::domain::models::{BackendKind, Severity};
use crate::services::redaction::rule_by_name;
use crate::services::timestamp::{validate_time_format, Zone, DEFAULT_TIME_FORMAT};

/// Project settings file read by [`SettingsLoader::load`]
pub const SETTINGS_FILE: &str = "polylog.yaml";

/// Optional local overrides of [`SETTINGS_FILE`]
pub const LOCAL_SETTINGS_FILE: &str = "polylog.local.yaml";

/// Prefix of environment overrides, e.g. `POLYLOG_LEVEL=debug`
pub const ENV_PREFIX: &str = "POLYLOG_";

/// Logger settings as read from files and the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogSettings {
    /// Engine name: tracing, log4rs, flexi, `env_logger`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Minimum severity: debug, info, warn, error, fatal
    #[serde(default = "default_level")]
    pub level: String,

    /// One JSON object per line
    #[serde(default)]
    pub json: bool,

    /// Primary sink path
    #[serde(default = "default_file")]
    pub file: PathBuf,

    /// Error sink path
    #[serde(default = "default_error_file")]
    pub error_file: PathBuf,

    /// Mirror Error and Fatal events to `error_file`
    #[serde(default = "default_true")]
    pub mirror_errors: bool,

    /// Echo the primary stream to stderr
    #[serde(default)]
    pub console: bool,

    /// Attach the call site to every primary record
    #[serde(default)]
    pub add_source: bool,

    /// strftime pattern
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// IANA zone name or `Local`
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Size-based rotation of the file sinks
    #[serde(default)]
    pub rotation: Option<RotationPolicy>,

    /// Colorize messages with the built-in scheme
    #[serde(default)]
    pub color: bool,

    /// Enable the built-in password and phone masks
    #[serde(default)]
    pub redact: bool,

    /// Additional built-in rules by name: password, phone, address, secrets
    #[serde(default)]
    pub redact_rules: Vec<String>,
}

fn default_backend() -> String {
    BackendKind::default().to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_error_file() -> PathBuf {
    PathBuf::from(DEFAULT_ERROR_FILE)
}

const fn default_true() -> bool {
    true
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_time_zone() -> String {
    "Local".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            level: default_level(),
            json: false,
            file: default_file(),
            error_file: default_error_file(),
            mirror_errors: default_true(),
            console: false,
            add_source: false,
            time_format: default_time_format(),
            time_zone: default_time_zone(),
            rotation: None,
            color: false,
            redact: false,
            redact_rules: Vec::new(),
        }
    }
}

impl LogSettings {
    /// Engine and ordered option list equivalent to these settings
    pub fn to_options(&self) -> Result<(BackendKind, Vec<LogOption>), ConfigError> {
        let kind: BackendKind = self.backend.parse()?;
        let level: Severity = self.level.parse()?;

        let mut options = vec![
            LogOption::Level(level),
            LogOption::FileOutput(self.file.clone()),
            LogOption::TimeFormat(self.time_format.clone()),
            LogOption::TimeZone(self.time_zone.clone()),
        ];
        options.push(if self.mirror_errors {
            LogOption::ErrorOutput(self.error_file.clone())
        } else {
            LogOption::NoErrorOutput
        });
        if self.json {
            options.push(LogOption::JsonFormat);
        }
        if self.console {
            options.push(LogOption::Console);
        }
        if self.add_source {
            options.push(LogOption::AddSource);
        }
        if let Some(policy) = self.rotation {
            options.push(LogOption::Rotation(policy));
        }
        if self.color {
            options.push(LogOption::Color);
        }
        if self.redact || !self.redact_rules.is_empty() {
            let extra = self
                .redact_rules
                .iter()
                .map(|name| {
                    rule_by_name(name).ok_or_else(|| {
                        ConfigError::Settings(format!("unknown redaction rule: {name}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            options.push(LogOption::Redaction(extra));
        }

        Ok((kind, options))
    }
}

/// Settings loader with hierarchical merging
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from the working directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `polylog.yaml`
    /// 3. `polylog.local.yaml` (optional)
    /// 4. Environment variables (`POLYLOG_*`, nested keys split on `__`)
    pub fn load() -> Result<LogSettings> {
        Self::load_layered([Path::new(SETTINGS_FILE), Path::new(LOCAL_SETTINGS_FILE)])
    }

    /// Merge the given files in order, then the environment
    ///
    /// Missing files are skipped.
    pub fn load_layered<'a>(files: impl IntoIterator<Item = &'a Path>) -> Result<LogSettings> {
        let figment = files
            .into_iter()
            .fold(Figment::new().merge(Serialized::defaults(LogSettings::default())), |fig, file| {
                fig.merge(Yaml::file(file))
            })
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let settings: LogSettings = figment
            .extract()
            .context("Failed to extract logging settings")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a single file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<LogSettings> {
        let settings: LogSettings = Figment::new()
            .merge(Serialized::defaults(LogSettings::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| {
                format!("Failed to load logging settings from {}", path.as_ref().display())
            })?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate settings after loading
    pub fn validate(settings: &LogSettings) -> Result<(), ConfigError> {
        settings.backend.parse::<BackendKind>()?;
        settings.level.parse::<Severity>()?;
        Zone::resolve(&settings.time_zone)?;
        validate_time_format(&settings.time_format)?;

        if let Some(policy) = settings.rotation {
            if policy.max_size_mb == 0 {
                return Err(ConfigError::Settings(
                    "rotation.max_size_mb must be at least 1".to_string(),
                ));
            }
        }

        if let Some(unknown) = settings
            .redact_rules
            .iter()
            .find(|name| rule_by_name(name).is_none())
        {
            return Err(ConfigError::Settings(format!(
                "unknown redaction rule: {unknown}. Must be one of: password, phone, address, secrets"
            )));
        }

        Ok(())
    }
}
