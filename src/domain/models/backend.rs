use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ConfigError;

/// Engine behind a [`crate::Logger`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `tracing` with a per-instance `tracing-subscriber` registry
    #[default]
    Tracing,
    /// `log4rs` with an immutable per-instance configuration
    Log4rs,
    /// `flexi_logger` built without being installed globally
    Flexi,
    /// `env_logger` built per instance, environment ignored
    #[serde(alias = "env")]
    EnvLogger,
}

impl BackendKind {
    /// Every kind, default first
    pub const ALL: [Self; 4] = [Self::Tracing, Self::Log4rs, Self::Flexi, Self::EnvLogger];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tracing => "tracing",
            Self::Log4rs => "log4rs",
            Self::Flexi => "flexi",
            Self::EnvLogger => "env_logger",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tracing" => Ok(Self::Tracing),
            "log4rs" => Ok(Self::Log4rs),
            "flexi" | "flexi_logger" => Ok(Self::Flexi),
            "env_logger" | "env" => Ok(Self::EnvLogger),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}
