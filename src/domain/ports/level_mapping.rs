use crate::domain::models::Severity;

/// Translation between [`Severity`] and one engine's level type
///
/// Mappings are order preserving: a more severe [`Severity`] never maps to
/// a less severe backend level. None of the supported engines has a fatal
/// tier, so `Fatal` shares the error tier and is told apart by the process
/// exit that follows it. Backend levels a mapping never produces come back
/// as [`Severity::Info`].
pub trait LevelMapping {
    /// The engine's own level type
    type Level: Copy;

    /// Level used when writing an event of `severity`
    fn to_backend(severity: Severity) -> Self::Level;

    /// Severity corresponding to an engine level
    fn from_backend(level: Self::Level) -> Severity;
}
