//! Readings and the inclusive time range they are analyzed over.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, ValidationError};

/// Formats accepted for timestamps that carry no UTC offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single timestamped measurement from the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Instant of the measurement, in the offset it was recorded with
    pub timestamp: DateTime<FixedOffset>,
    /// Measured value (e.g. SCADA power)
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<FixedOffset>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Parse a reading from its textual timestamp and value.
    ///
    /// Timestamps without an offset are interpreted in `default_offset`.
    pub fn parse(
        timestamp: &str,
        value: f64,
        default_offset: FixedOffset,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            timestamp: parse_timestamp(timestamp, default_offset)?,
            value,
        })
    }
}

/// Inclusive range of instants `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl ReadingRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ValidationError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Range covering whole calendar days, from the first microsecond of
    /// `start` through the last microsecond of `end`, in `offset`.
    pub fn from_dates(
        start: NaiveDate,
        end: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Self, ValidationError> {
        let end_of_day = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).ok_or_else(|| {
            ValidationError::InvalidValue {
                field: "end".into(),
                message: "cannot represent end of day".into(),
            }
        })?;
        let start = localize(start.and_time(NaiveTime::MIN), offset, "start")?;
        let end = localize(end.and_time(end_of_day), offset, "end")?;
        Self::new(start, end)
    }

    /// Fail with `InvalidRange` when start lies after end.
    ///
    /// Fields are public, so ranges built by hand are re-checked by the
    /// aggregator through this method.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Whether `timestamp` falls within the range, bounds included.
    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }
}

fn localize(
    naive: NaiveDateTime,
    offset: FixedOffset,
    field: &str,
) -> Result<DateTime<FixedOffset>, ValidationError> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("{naive} is not representable at offset {offset}"),
        })
}

/// Parse a timestamp in RFC 3339 form, or one of the naive
/// `YYYY-MM-DD HH:MM[:SS[.fff]]` forms interpreted in `default_offset`.
pub fn parse_timestamp(
    raw: &str,
    default_offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, SourceError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| default_offset.from_local_datetime(&naive).single())
        .ok_or_else(|| SourceError::BadTimestamp(raw.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ValidationError::InvalidValue {
        field: "date".into(),
        message: format!("'{raw}': {e}"),
    })
}

/// Parse a UTC offset such as `+07:00`, `-05:30` or `Z`.
pub fn parse_offset(raw: &str) -> Result<FixedOffset, ValidationError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    raw.parse::<FixedOffset>()
        .map_err(|e| ValidationError::InvalidValue {
            field: "offset".into(),
            message: format!("'{raw}': {e}"),
        })
}

/// The zero offset.
pub fn utc() -> FixedOffset {
    Utc.fix()
}
