//! Logging infrastructure shared by the backend adapters
//!
//! - Event pipeline: threshold, derived fields, redaction, timestamps
//! - Line rendering for engines that take preformatted text
//! - Output sinks with size-based rotation

pub mod pipeline;
pub mod render;
pub mod rotation;
pub mod sink;

pub use pipeline::{EventPipeline, Prepared};
pub use rotation::RotatingFile;
pub use sink::SharedSink;
