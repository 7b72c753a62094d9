use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a logger
///
/// Construction is the only fallible part of the facade: once a logger
/// exists, logging calls are fire-and-forget and sink failures are
/// swallowed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Unknown backend: {0}. Must be one of: tracing, log4rs, flexi, env_logger")]
    UnknownBackend(String),

    #[error("Invalid log level: {0}. Must be one of: debug, info, warn, error, fatal")]
    InvalidLevel(String),

    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Cannot open log output {path}: {source}")]
    UnusableOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{backend} engine rejected its configuration: {message}")]
    Engine {
        backend: &'static str,
        message: String,
    },

    #[error("Invalid logging settings: {0}")]
    Settings(String),
}

impl ConfigError {
    pub(crate) fn engine(backend: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Engine {
            backend,
            message: err.to_string(),
        }
    }
}
