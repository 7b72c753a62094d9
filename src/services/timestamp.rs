use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::domain::error::ConfigError;

/// Default strftime pattern, e.g. `2024-05-01 12:00:00`
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Frequently used IANA zone names
pub mod zones {
    /// China Standard Time (UTC+8)
    pub const CST: &str = "Asia/Shanghai";
    /// Japan Standard Time (UTC+9)
    pub const JST: &str = "Asia/Tokyo";
    /// India Standard Time (UTC+5:30)
    pub const IST: &str = "Asia/Kolkata";
    /// Korea Standard Time (UTC+9)
    pub const KST: &str = "Asia/Seoul";
    /// US Eastern (UTC-5, DST UTC-4)
    pub const EST: &str = "America/New_York";
    /// US Central (UTC-6, DST UTC-5)
    pub const CST_US: &str = "America/Chicago";
    /// US Mountain (UTC-7, DST UTC-6)
    pub const MST: &str = "America/Denver";
    /// US Pacific (UTC-8, DST UTC-7)
    pub const PST: &str = "America/Los_Angeles";
    /// Brasilia Time (UTC-3)
    pub const BRT: &str = "America/Sao_Paulo";
    /// Coordinated Universal Time
    pub const UTC: &str = "UTC";
    /// Greenwich Mean Time (UTC+0, DST UTC+1)
    pub const GMT: &str = "Europe/London";
    /// Central European Time (UTC+1, DST UTC+2)
    pub const CET: &str = "Europe/Paris";
    /// Eastern European Time (UTC+2, DST UTC+3)
    pub const EET: &str = "Europe/Athens";
    /// Australian Eastern (UTC+10, DST UTC+11)
    pub const AEST: &str = "Australia/Sydney";
    /// New Zealand (UTC+12, DST UTC+13)
    pub const NZ: &str = "Pacific/Auckland";
    /// South Africa Standard Time (UTC+2)
    pub const SAST: &str = "Africa/Johannesburg";
    /// East Africa Time (UTC+3)
    pub const EAT: &str = "Africa/Nairobi";
}

/// Zone used to render event timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The process-local zone
    #[default]
    Local,
    /// A zone from the IANA database
    Named(Tz),
}

impl Zone {
    /// Resolve a zone name
    ///
    /// An empty name or `"Local"` selects the process-local zone. Any other
    /// name must exist in the IANA database.
    pub fn resolve(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ConfigError::UnknownTimeZone(name.to_string()))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Renders instants in a fixed zone and strftime pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamper {
    zone: Zone,
    format: String,
}

impl Timestamper {
    /// Create a timestamper, rejecting patterns chrono cannot render
    pub fn new(zone: Zone, format: impl Into<String>) -> Result<Self, ConfigError> {
        let format = format.into();
        validate_time_format(&format)?;
        Ok(Self { zone, format })
    }

    /// Process-local zone with [`DEFAULT_TIME_FORMAT`]
    pub fn local_default() -> Self {
        Self {
            zone: Zone::Local,
            format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    pub const fn zone(&self) -> Zone {
        self.zone
    }

    pub fn format_str(&self) -> &str {
        &self.format
    }

    /// Format `at` converted into the configured zone
    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self.zone {
            Zone::Local => at.with_timezone(&Local).format(&self.format).to_string(),
            Zone::Named(tz) => at.with_timezone(&tz).format(&self.format).to_string(),
        }
    }

    /// Format the current instant
    pub fn now(&self) -> String {
        self.format(Utc::now())
    }
}

/// Check a strftime pattern
pub fn validate_time_format(format: &str) -> Result<(), ConfigError> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimeFormat(format.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeDelta};

    fn instant() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T03:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parse(rendered: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(rendered, DEFAULT_TIME_FORMAT).unwrap()
    }

    #[test]
    fn test_tokyo_differs_from_utc_by_offset() {
        let tokyo = Timestamper::new(Zone::resolve(zones::JST).unwrap(), DEFAULT_TIME_FORMAT).unwrap();
        let utc = Timestamper::new(Zone::resolve(zones::UTC).unwrap(), DEFAULT_TIME_FORMAT).unwrap();

        let tokyo_rendered = tokyo.format(instant());
        let utc_rendered = utc.format(instant());

        assert_eq!(utc_rendered, "2024-01-15 03:30:00");
        assert_eq!(tokyo_rendered, "2024-01-15 12:30:00");
        assert_eq!(parse(&tokyo_rendered) - parse(&utc_rendered), TimeDelta::hours(9));
    }

    #[test]
    fn test_half_hour_offset() {
        let kolkata = Timestamper::new(Zone::resolve(zones::IST).unwrap(), "%H:%M").unwrap();
        assert_eq!(kolkata.format(instant()), "09:00");
    }

    #[test]
    fn test_resolve_local_and_unknown() {
        assert_eq!(Zone::resolve("").unwrap(), Zone::Local);
        assert_eq!(Zone::resolve("Local").unwrap(), Zone::Local);
        assert!(matches!(
            Zone::resolve("Mars/Olympus_Mons"),
            Err(ConfigError::UnknownTimeZone(name)) if name == "Mars/Olympus_Mons"
        ));
    }

    #[test]
    fn test_zone_display() {
        assert_eq!(Zone::resolve(zones::JST).unwrap().to_string(), "Asia/Tokyo");
        assert_eq!(Zone::Local.to_string(), "Local");
    }

    #[test]
    fn test_invalid_time_format_rejected() {
        assert!(matches!(
            Timestamper::new(Zone::Local, "%Y-%Q"),
            Err(ConfigError::InvalidTimeFormat(_))
        ));
        assert!(Timestamper::new(Zone::Local, "").is_err());
        assert!(Timestamper::new(Zone::Local, "%d/%m/%Y %T").is_ok());
    }
}
