//! Port trait definitions (Hexagonal Architecture)
//!
//! Contracts the infrastructure adapters satisfy:
//! - `LogBackend`: the per-variant logging contract
//! - `RedactionRule`: one step of the redaction pipeline
//! - `LevelMapping`: severity translation for one engine

pub mod level_mapping;
pub mod logger;
pub mod redaction;

pub use level_mapping::LevelMapping;
pub use logger::LogBackend;
pub use redaction::RedactionRule;
