//! Property tests for aggregation and peak selection.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use peakhour_core::reading::{parse_date, parse_timestamp, utc};
use peakhour_core::{aggregate, daily_peaks, hour_frequency, Reading, ReadingRange};
use proptest::prelude::*;

fn may() -> ReadingRange {
    ReadingRange::from_dates(
        parse_date("2024-05-01").unwrap(),
        parse_date("2024-05-31").unwrap(),
        utc(),
    )
    .unwrap()
}

/// Readings spread over late April to early June with integer values, so
/// sums are exact.
fn readings_strategy() -> impl Strategy<Value = Vec<Reading>> {
    prop::collection::vec((0i64..(45 * 24 * 60), 0u32..100_000), 0..300).prop_map(|raw| {
        let origin = parse_timestamp("2024-04-25T00:00:00Z", utc()).unwrap();
        raw.into_iter()
            .map(|(minutes, value)| Reading::new(origin + Duration::minutes(minutes), value as f64))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_total_is_conserved(readings in readings_strategy()) {
        let range = may();
        let buckets = aggregate(&readings, &range).unwrap();

        let bucket_sum: f64 = buckets.iter().map(|b| b.total).sum();
        let reading_sum: f64 = readings
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .map(|r| r.value)
            .sum();

        prop_assert_eq!(bucket_sum, reading_sum);
    }

    #[test]
    fn prop_one_peak_per_day_and_it_is_maximal(readings in readings_strategy()) {
        let buckets = aggregate(&readings, &may()).unwrap();
        let peaks = daily_peaks(&buckets);

        let days: BTreeSet<NaiveDate> = buckets.iter().map(|b| b.day).collect();
        prop_assert_eq!(peaks.len(), days.len());

        for peak in &peaks {
            for bucket in buckets.iter().filter(|b| b.day == peak.day) {
                prop_assert!(peak.total >= bucket.total);
                if bucket.total == peak.total {
                    prop_assert!(peak.peak_hour <= bucket.hour);
                }
            }
        }
    }

    #[test]
    fn prop_frequencies_sum_to_days(readings in readings_strategy()) {
        let buckets = aggregate(&readings, &may()).unwrap();
        let peaks = daily_peaks(&buckets);
        let freq = hour_frequency(&peaks);

        let total: u32 = freq.iter().map(|f| f.frequency).sum();
        prop_assert_eq!(total as usize, peaks.len());

        for pair in freq.windows(2) {
            prop_assert!(
                pair[0].frequency > pair[1].frequency
                    || (pair[0].frequency == pair[1].frequency && pair[0].hour < pair[1].hour)
            );
        }
    }

    #[test]
    fn prop_buckets_sorted_and_sparse(readings in readings_strategy()) {
        let buckets = aggregate(&readings, &may()).unwrap();

        for pair in buckets.windows(2) {
            prop_assert!((pair[0].day, pair[0].hour) < (pair[1].day, pair[1].hour));
        }
        prop_assert!(buckets.len() <= readings.len());
    }

    #[test]
    fn prop_input_order_is_irrelevant(readings in readings_strategy()) {
        let mut reversed = readings.clone();
        reversed.reverse();

        let a = aggregate(&readings, &may()).unwrap();
        let b = aggregate(&reversed, &may()).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hour_frequency(&daily_peaks(&a)), hour_frequency(&daily_peaks(&b)));
    }
}
