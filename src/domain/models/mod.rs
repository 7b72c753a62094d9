pub mod backend;
pub mod event;
pub mod severity;

pub use backend::BackendKind;
pub use event::{text_value, Attributes, CallSite, LogEvent};
pub use severity::{LevelSwitch, Severity};
