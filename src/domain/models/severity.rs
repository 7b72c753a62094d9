use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::domain::error::ConfigError;

/// Severity of a log event
///
/// Severities are totally ordered from least (`Debug`) to most severe
/// (`Fatal`). The order drives both threshold filtering and dual-sink
/// routing.
///
/// # Examples
///
/// ```
/// use polylog::Severity;
///
/// assert!(Severity::Fatal > Severity::Error);
/// assert!(Severity::Debug < Severity::Info);
/// assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail, usually disabled in production
    Debug,
    /// Normal operational events
    #[default]
    Info,
    /// Something unexpected that did not stop the operation
    Warn,
    /// A failed operation
    Error,
    /// An unrecoverable failure; the process exits after the event is written
    Fatal,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Self; 5] = [Self::Debug, Self::Info, Self::Warn, Self::Error, Self::Fatal];

    /// Upper-case tag used by the text renderers
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Whether events of this severity are mirrored to the error sink
    pub const fn is_error_or_above(&self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    const fn to_u8(self) -> u8 {
        self as u8
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            3 => Self::Error,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ConfigError::InvalidLevel(s.to_string())),
        }
    }
}

/// Shared, atomically updated filter threshold
///
/// Cloning a switch shares the underlying threshold, so loggers derived
/// with `with_fields` observe `set_level` calls made on their parent.
#[derive(Debug, Clone)]
pub struct LevelSwitch(Arc<AtomicU8>);

impl LevelSwitch {
    /// Create a switch starting at `level`
    pub fn new(level: Severity) -> Self {
        Self(Arc::new(AtomicU8::new(level.to_u8())))
    }

    /// Current threshold
    pub fn get(&self) -> Severity {
        Severity::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Replace the threshold
    pub fn set(&self, level: Severity) {
        self.0.store(level.to_u8(), Ordering::Release);
    }

    /// Whether an event of `severity` passes the threshold
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.get()
    }
}
