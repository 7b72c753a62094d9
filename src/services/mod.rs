//! Pure services shared by every backend adapter

pub mod color_theme;
pub mod redaction;
pub mod timestamp;

pub use color_theme::{Color, ColorScheme};
pub use redaction::{
    builtin_rules, rule_by_name, AddressMask, PasswordMask, PhoneMask, RedactionPipeline,
    SecretPatternMask, PASSWORD_PLACEHOLDER,
};
pub use timestamp::{validate_time_format, zones, Timestamper, Zone, DEFAULT_TIME_FORMAT};
