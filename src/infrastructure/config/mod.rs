//! Configuration management infrastructure
//!
//! - Ordered option application into a frozen [`LogConfig`]
//! - YAML file loading with environment overrides via figment
//! - Validation of loaded settings

pub mod builder;
pub mod loader;

pub use builder::{
    ConfigBuilder, LogConfig, LogOption, RotationPolicy, DEFAULT_ERROR_FILE, DEFAULT_LOG_FILE,
};
pub use loader::{LogSettings, SettingsLoader};
