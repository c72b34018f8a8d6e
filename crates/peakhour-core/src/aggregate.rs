//! Hourly aggregation of raw readings.
//!
//! Readings are summed into sparse (day, hour) buckets. Day and hour are
//! taken from each reading's own offset, so a reading recorded at
//! `19:15+07:00` lands in hour 19 of its local calendar day.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::reading::{Reading, ReadingRange};

/// Sum of all readings sharing the same day and hour-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub day: NaiveDate,
    /// Hour of day (0-23)
    pub hour: u8,
    pub total: f64,
}

/// Group in-range readings by (day, hour) and sum their values.
///
/// Output is ascending by (day, hour) and contains only buckets with at
/// least one reading. Values inside a bucket are summed in
/// (timestamp, value) order, so any permutation of the same input yields
/// bit-identical totals.
///
/// # Errors
/// Returns `ValidationError::InvalidRange` if `range.start > range.end`.
pub fn aggregate(
    readings: &[Reading],
    range: &ReadingRange,
) -> Result<Vec<HourBucket>, ValidationError> {
    range.validate()?;

    let mut grouped: BTreeMap<(NaiveDate, u8), Vec<&Reading>> = BTreeMap::new();
    for reading in readings.iter().filter(|r| range.contains(&r.timestamp)) {
        let key = (reading.timestamp.date_naive(), reading.timestamp.hour() as u8);
        grouped.entry(key).or_default().push(reading);
    }

    let buckets: Vec<HourBucket> = grouped
        .into_iter()
        .map(|((day, hour), mut members)| {
            members.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.value.total_cmp(&b.value))
            });
            HourBucket {
                day,
                hour,
                total: members.iter().map(|r| r.value).sum(),
            }
        })
        .collect();

    debug!(
        readings = readings.len(),
        buckets = buckets.len(),
        "aggregated readings into hourly buckets"
    );
    Ok(buckets)
}
