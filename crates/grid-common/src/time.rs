//! Time handling for CF-style coordinate variables.
//!
//! Forecast datasets encode initialization times as numbers with a units
//! attribute such as `"hours since 1970-01-01 00:00:00"` and lead times as
//! plain durations (`"hours"`, `"days"`). This module converts between those
//! encodings and `chrono` values.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Parse a unit name (singular, plural or abbreviated).
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(Self::Seconds),
            "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(TimeParseError::UnknownUnit(other.to_string())),
        }
    }

    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86_400.0,
        }
    }

    /// Convert a value expressed in hours into this unit.
    pub fn from_hours(&self, hours: f64) -> f64 {
        hours * 3600.0 / self.seconds()
    }
}

/// Parsed `"<unit> since <epoch>"` units attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a CF units string such as `"hours since 1970-01-01 00:00:00"`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (unit, epoch) = s
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(s.to_string()))?;

        Ok(Self {
            unit: TimeUnit::parse(unit)?,
            epoch: parse_datetime(epoch.trim())?,
        })
    }

    /// Encode a datetime as an offset from the epoch in this unit.
    pub fn encode(&self, dt: DateTime<Utc>) -> f64 {
        let delta = dt - self.epoch;
        delta.num_milliseconds() as f64 / 1000.0 / self.unit.seconds()
    }

    /// Decode an offset into a datetime (millisecond precision).
    ///
    /// Returns `None` for non-finite offsets and for datetimes outside the
    /// representable range.
    pub fn decode(&self, value: f64) -> Option<DateTime<Utc>> {
        let millis = (value * self.unit.seconds() * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        let delta = Duration::try_milliseconds(millis as i64)?;
        self.epoch.checked_add_signed(delta)
    }
}

/// Parse an ISO 8601 datetime, a space separated datetime, or a bare date.
///
/// Values without an offset are taken as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),

    #[error("Unknown time unit: {0}")]
    UnknownUnit(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_datetime_variants() {
        let dt = parse_datetime("2019-12-31T06:00:00Z").unwrap();
        assert_eq!(dt.year(), 2019);
        assert_eq!(dt.hour(), 6);

        let dt = parse_datetime("2019-12-31").unwrap();
        assert_eq!(dt.day(), 31);
        assert_eq!(dt.hour(), 0);

        let dt = parse_datetime("2019-12-31 12:30:00").unwrap();
        assert_eq!(dt.minute(), 30);

        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_cf_units_roundtrip() {
        let units = CfTimeUnits::parse("hours since 1970-01-01 00:00:00").unwrap();
        assert_eq!(units.unit, TimeUnit::Hours);

        let dt = Utc.with_ymd_and_hms(1970, 1, 2, 6, 0, 0).unwrap();
        assert_eq!(units.encode(dt), 30.0);
        assert_eq!(units.decode(30.0), Some(dt));
    }

    #[test]
    fn test_cf_decode_out_of_range() {
        let units = CfTimeUnits::parse("hours since 1970-01-01 00:00:00").unwrap();
        assert_eq!(units.decode(1e12), None);
        assert_eq!(units.decode(1e15), None);
        assert_eq!(units.decode(-1e30), None);
        assert_eq!(units.decode(f64::NAN), None);
        assert_eq!(units.decode(f64::INFINITY), None);
    }

    #[test]
    fn test_cf_units_rejects_garbage() {
        assert!(matches!(
            CfTimeUnits::parse("hours"),
            Err(TimeParseError::InvalidUnits(_))
        ));
        assert!(matches!(
            CfTimeUnits::parse("fortnights since 1970-01-01"),
            Err(TimeParseError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_time_unit_from_hours() {
        assert_eq!(TimeUnit::Days.from_hours(48.0), 2.0);
        assert_eq!(TimeUnit::Seconds.from_hours(1.0), 3600.0);
    }
}
