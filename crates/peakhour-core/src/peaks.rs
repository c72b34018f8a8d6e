//! Daily peak selection and peak-hour frequency rollup.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::HourBucket;

/// The hour with the highest total on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPeak {
    pub day: NaiveDate,
    /// Hour of day (0-23)
    pub peak_hour: u8,
    pub total: f64,
}

/// How often an hour of day was the daily peak across the range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourFrequency {
    /// Hour of day (0-23)
    pub hour: u8,
    /// Number of days for which this hour was the peak
    pub frequency: u32,
    /// Mean peak total over those days
    pub avg_peak_total: f64,
}

/// Whether `candidate` should replace `current` as the day's peak.
///
/// Higher total wins; equal totals go to the earlier hour. A NaN total
/// never displaces a comparable one.
fn beats(candidate: &HourBucket, current: &HourBucket) -> bool {
    candidate.total > current.total
        || (candidate.total == current.total && candidate.hour < current.hour)
        || (current.total.is_nan() && !candidate.total.is_nan())
}

/// Select the peak hour of each day.
///
/// Output is ascending by day with exactly one entry per day present in
/// `buckets`. Input order does not matter.
pub fn daily_peaks(buckets: &[HourBucket]) -> Vec<DailyPeak> {
    let mut best: BTreeMap<NaiveDate, &HourBucket> = BTreeMap::new();
    for bucket in buckets {
        best.entry(bucket.day)
            .and_modify(|current| {
                if beats(bucket, *current) {
                    *current = bucket;
                }
            })
            .or_insert(bucket);
    }

    best.into_values()
        .map(|b| DailyPeak {
            day: b.day,
            peak_hour: b.hour,
            total: b.total,
        })
        .collect()
}

/// Count how many days peaked at each hour and average their peak totals.
///
/// Ordered by frequency descending, then hour ascending. Totals are summed
/// in day order so the average does not depend on input order.
pub fn hour_frequency(peaks: &[DailyPeak]) -> Vec<HourFrequency> {
    let mut by_hour: BTreeMap<u8, Vec<&DailyPeak>> = BTreeMap::new();
    for peak in peaks {
        by_hour.entry(peak.peak_hour).or_default().push(peak);
    }

    let mut rows: Vec<HourFrequency> = by_hour
        .into_iter()
        .map(|(hour, mut days)| {
            days.sort_by_key(|p| p.day);
            let sum: f64 = days.iter().map(|p| p.total).sum();
            HourFrequency {
                hour,
                frequency: days.len() as u32,
                avg_peak_total: sum / days.len() as f64,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.hour.cmp(&b.hour)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::parse_date;

    fn bucket(day: &str, hour: u8, total: f64) -> HourBucket {
        HourBucket {
            day: parse_date(day).unwrap(),
            hour,
            total,
        }
    }

    fn peak(day: &str, hour: u8, total: f64) -> DailyPeak {
        DailyPeak {
            day: parse_date(day).unwrap(),
            peak_hour: hour,
            total,
        }
    }

    #[test]
    fn test_daily_peaks_picks_max_per_day() {
        let buckets = vec![
            bucket("2024-05-01", 17, 1000.0),
            bucket("2024-05-01", 19, 1500.0),
            bucket("2024-05-02", 19, 1200.0),
        ];

        let peaks = daily_peaks(&buckets);

        assert_eq!(
            peaks,
            vec![peak("2024-05-01", 19, 1500.0), peak("2024-05-02", 19, 1200.0)]
        );
    }

    #[test]
    fn test_tie_goes_to_smallest_hour() {
        let buckets = vec![
            bucket("2024-05-01", 9, 800.0),
            bucket("2024-05-01", 5, 800.0),
            bucket("2024-05-01", 12, 100.0),
        ];

        let peaks = daily_peaks(&buckets);

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].peak_hour, 5);
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_day() {
        let buckets = vec![
            bucket("2024-05-03", 1, 1.0),
            bucket("2024-05-01", 1, 1.0),
            bucket("2024-05-02", 1, 1.0),
        ];

        let days: Vec<_> = daily_peaks(&buckets).iter().map(|p| p.day.to_string()).collect();
        assert_eq!(days, vec!["2024-05-01", "2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn test_nan_never_wins() {
        let buckets = vec![
            bucket("2024-05-01", 1, f64::NAN),
            bucket("2024-05-01", 2, 3.0),
            bucket("2024-05-01", 3, f64::NAN),
        ];

        let peaks = daily_peaks(&buckets);
        assert_eq!(peaks[0].peak_hour, 2);
    }

    #[test]
    fn test_all_negative_day_still_has_a_peak() {
        let buckets = vec![bucket("2024-05-01", 1, -10.0), bucket("2024-05-01", 2, -3.0)];
        assert_eq!(daily_peaks(&buckets)[0].peak_hour, 2);
    }

    #[test]
    fn test_daily_peaks_empty() {
        assert!(daily_peaks(&[]).is_empty());
    }

    #[test]
    fn test_hour_frequency_example() {
        let peaks = vec![peak("2024-05-01", 19, 1500.0), peak("2024-05-02", 19, 1200.0)];

        let freq = hour_frequency(&peaks);

        assert_eq!(
            freq,
            vec![HourFrequency {
                hour: 19,
                frequency: 2,
                avg_peak_total: 1350.0,
            }]
        );
    }

    #[test]
    fn test_hour_frequency_ordering() {
        let peaks = vec![
            peak("2024-05-01", 20, 10.0),
            peak("2024-05-02", 9, 10.0),
            peak("2024-05-03", 19, 10.0),
            peak("2024-05-04", 20, 30.0),
            peak("2024-05-05", 19, 20.0),
        ];

        let freq = hour_frequency(&peaks);
        let order: Vec<_> = freq.iter().map(|f| (f.hour, f.frequency)).collect();

        assert_eq!(order, vec![(19, 2), (20, 2), (9, 1)]);
        assert_eq!(freq[1].avg_peak_total, 20.0);
    }

    #[test]
    fn test_hour_frequency_empty() {
        assert!(hour_frequency(&[]).is_empty());
    }
}
