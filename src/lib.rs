//! Polylog - Structured Logging Facade
//!
//! One logging contract over four interchangeable engines (`tracing`,
//! `log4rs`, `flexi_logger`, `env_logger`), configured uniformly. Every
//! engine gets the same treatment:
//!
//! - **Dual-sink routing**: the primary stream receives everything at or
//!   above the threshold; `Error` and `Fatal` are also written to a
//!   dedicated error stream with the call site attached
//! - **Field redaction**: sensitive key/value pairs are rewritten before
//!   they reach any sink
//! - **Level normalization**: one [`Severity`] scale mapped onto each
//!   engine's own levels, with shared timestamp and time-zone handling
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): severity model, events and port traits
//! - **Service Layer** (`services`): redaction, colour and timestamp logic
//! - **Infrastructure Layer** (`infrastructure`): configuration, sinks and
//!   the engine adapters
//! - **Application Layer** (`application`): the [`Logger`] facade
//!
//! # Example
//!
//! ```
//! use polylog::{args, Logger, LogOption, Severity};
//! use std::collections::HashMap;
//!
//! # let dir = tempfile::tempdir().unwrap();
//! let logger = Logger::new([
//!     LogOption::FileOutput(dir.path().join("app.log")),
//!     LogOption::ErrorOutput(dir.path().join("app_error.log")),
//!     LogOption::Redaction(vec![]),
//!     LogOption::Level(Severity::Debug),
//! ])?;
//!
//! logger.info("user login", args!["user", "bob", "password", "hunter2"]);
//!
//! let request = logger.with_fields(HashMap::from([("request_id".to_string(), 42.into())]));
//! request.warn("slow response", args!["ms", 930]);
//! logger.flush();
//! # Ok::<(), polylog::ConfigError>(())
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
#[doc(hidden)]
pub use application::__value;
pub use application::Logger;
pub use domain::models::{
    Attributes, BackendKind, CallSite, LevelSwitch, LogEvent, Severity,
};
pub use domain::ports::{LevelMapping, LogBackend, RedactionRule};
pub use domain::ConfigError;
pub use infrastructure::config::{
    ConfigBuilder, LogConfig, LogOption, LogSettings, RotationPolicy, SettingsLoader,
};
pub use serde_json::Value;
pub use services::{
    zones, AddressMask, Color, ColorScheme, PasswordMask, PhoneMask, RedactionPipeline,
    SecretPatternMask, Timestamper, Zone,
};
