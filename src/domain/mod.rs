//! Domain layer for the logging facade
//!
//! Severity model, log events and the ports the adapters implement.

pub mod error;
pub mod models;
pub mod ports;

pub use error::ConfigError;
