//! Application layer: the `Logger` facade callers hold

pub mod facade;

#[doc(hidden)]
pub use facade::__value;
pub use facade::Logger;
