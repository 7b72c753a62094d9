use serde_json::Value;
use std::collections::HashMap;

use crate::domain::models::{LogEvent, Severity};

/// Port trait every backend adapter implements
///
/// This trait is the abstract logging contract of the facade. Each adapter
/// wraps exactly one external engine and runs the same per-call pipeline:
///
/// 1. **Filter** events below the current threshold
/// 2. **Redact** the key/value arguments when redaction is enabled
/// 3. **Stamp** the event time in the configured zone and format
/// 4. **Colorize** the free-text message when colour is enabled
/// 5. **Emit** to the primary engine at the mapped backend level
/// 6. **Mirror** `Error` and `Fatal` events to the error-only engine, always
///    with the call site attached
/// 7. On `Fatal`, **flush** both engines and exit the process
///
/// # Design Rationale
///
/// Callers usually go through [`crate::Logger`], a closed set of variants
/// that resolves the call site with `#[track_caller]` before handing the
/// event over. Events built directly with [`LogEvent::new`] carry the
/// location that created them, so mirrored records always have one. Keeping the
/// contract synchronous matches the engines, which all write on the
/// calling thread.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Engine handles are individually
/// safe for concurrent writes; the sinks underneath serialize writes with
/// their own lock.
///
/// # Examples
///
/// ```
/// use polylog::{args, BackendKind, LogBackend, LogEvent, Logger, LogOption, Severity};
///
/// fn emit(backend: &dyn LogBackend) {
///     backend.log(LogEvent::new(Severity::Info, "cache warmed", args!["entries", 128]));
/// }
///
/// # let dir = tempfile::tempdir().unwrap();
/// let logger = Logger::with_kind(
///     BackendKind::Tracing,
///     [LogOption::FileOutput(dir.path().join("app.log")), LogOption::NoErrorOutput],
/// )
/// .unwrap();
/// emit(logger.backend());
/// ```
pub trait LogBackend: Send + Sync {
    /// Run the full pipeline for one event
    ///
    /// Never fails: sink errors are swallowed. A `Fatal` event does not
    /// return.
    fn log(&self, event: LogEvent);

    /// Change the filter threshold for subsequent calls
    ///
    /// A no-op on adapters whose engine cannot change level after
    /// construction; see [`LogBackend::supports_runtime_level_change`].
    fn set_level(&self, level: Severity);

    /// Current filter threshold
    fn level(&self) -> Severity;

    /// Whether [`LogBackend::set_level`] has any effect
    fn supports_runtime_level_change(&self) -> bool;

    /// Derive a view that adds `fields` to every subsequent event
    ///
    /// The receiver is left untouched. Which cosmetic settings (colour,
    /// call site) the view keeps is adapter specific; the field set,
    /// threshold and redaction are always carried.
    fn with_fields(&self, fields: HashMap<String, Value>) -> Self
    where
        Self: Sized;

    /// Flush primary and error engines
    fn flush(&self);
}
