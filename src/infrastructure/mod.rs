//! Infrastructure layer module
//!
//! Configuration loading, output sinks and the adapters over the external
//! logging engines. Adapters satisfy the port traits defined in the domain
//! layer.

pub mod backends;
pub mod config;
pub mod logging;
