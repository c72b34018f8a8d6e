//! Integration tests for the peak-hour pipeline.
//!
//! This test file verifies:
//! - The worked May 2024 example end to end
//! - Tie-breaking and range boundaries
//! - Repeatability of the output tables
//! - Empty input behaviour

use chrono::Duration;
use peakhour_core::reading::{parse_date, parse_timestamp, utc};
use peakhour_core::{
    aggregate, daily_peaks, hour_frequency, DailyPeak, HourFrequency, PeakAnalyzer, Reading,
    ReadingRange, ValidationError,
};

fn reading(ts: &str, value: f64) -> Reading {
    Reading::new(parse_timestamp(ts, utc()).unwrap(), value)
}

fn range(start: &str, end: &str) -> ReadingRange {
    ReadingRange::from_dates(parse_date(start).unwrap(), parse_date(end).unwrap(), utc()).unwrap()
}

#[test]
fn test_may_example() {
    let readings = vec![
        reading("2024-05-01T17:05:00Z", 250.0),
        reading("2024-05-01T17:35:00Z", 750.0),
        reading("2024-05-01T19:00:00Z", 700.0),
        reading("2024-05-01T19:30:00Z", 800.0),
        reading("2024-05-02T19:10:00Z", 1200.0),
    ];

    let analysis = PeakAnalyzer::new()
        .analyze(&readings, &range("2024-05-01", "2024-05-31"))
        .unwrap();

    assert_eq!(
        analysis.daily_peaks,
        vec![
            DailyPeak {
                day: parse_date("2024-05-01").unwrap(),
                peak_hour: 19,
                total: 1500.0,
            },
            DailyPeak {
                day: parse_date("2024-05-02").unwrap(),
                peak_hour: 19,
                total: 1200.0,
            },
        ]
    );
    assert_eq!(
        analysis.hour_frequency,
        vec![HourFrequency {
            hour: 19,
            frequency: 2,
            avg_peak_total: 1350.0,
        }]
    );
}

#[test]
fn test_tie_between_hours_five_and_nine() {
    let readings = vec![
        reading("2024-05-03T09:00:00Z", 400.0),
        reading("2024-05-03T05:00:00Z", 400.0),
    ];

    let buckets = aggregate(&readings, &range("2024-05-01", "2024-05-31")).unwrap();
    let peaks = daily_peaks(&buckets);

    assert_eq!(peaks.len(), 1);
    assert_eq!(peaks[0].peak_hour, 5);
}

#[test]
fn test_boundary_instants() {
    let start = parse_timestamp("2024-05-01T00:00:00Z", utc()).unwrap();
    let end = parse_timestamp("2024-05-01T23:00:00Z", utc()).unwrap();
    let window = ReadingRange::new(start, end).unwrap();
    let one_us = Duration::microseconds(1);

    let readings = vec![
        Reading::new(start, 1.0),
        Reading::new(end, 2.0),
        Reading::new(start - one_us, 100.0),
        Reading::new(end + one_us, 100.0),
    ];

    let buckets = aggregate(&readings, &window).unwrap();
    let total: f64 = buckets.iter().map(|b| b.total).sum();

    assert_eq!(buckets.len(), 2);
    assert_eq!(total, 3.0);
}

#[test]
fn test_reversed_range_is_rejected() {
    let reversed = ReadingRange {
        start: parse_timestamp("2024-05-31T00:00:00Z", utc()).unwrap(),
        end: parse_timestamp("2024-05-01T00:00:00Z", utc()).unwrap(),
    };

    let err = PeakAnalyzer::new().analyze(&[], &reversed).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidRange { .. }));
}

#[test]
fn test_empty_readings_give_empty_tables() {
    let analysis = PeakAnalyzer::new()
        .analyze(&[], &range("2024-05-01", "2024-05-31"))
        .unwrap();

    assert!(analysis.buckets.is_empty());
    assert!(analysis.daily_peaks.is_empty());
    assert!(analysis.hour_frequency.is_empty());
    assert!(analysis.is_empty());
}

#[test]
fn test_readings_outside_range_only() {
    let readings = vec![reading("2024-06-15T12:00:00Z", 10.0)];

    let analysis = PeakAnalyzer::new()
        .analyze(&readings, &range("2024-05-01", "2024-05-31"))
        .unwrap();

    assert!(analysis.is_empty());
    assert_eq!(analysis.readings_used, 0);
}

#[test]
fn test_repeated_runs_are_identical() {
    let readings: Vec<Reading> = (0..500)
        .map(|i| {
            let ts = parse_timestamp("2024-05-01T00:00:00Z", utc()).unwrap()
                + Duration::minutes(i * 37);
            Reading::new(ts, (i as f64).sin().abs() * 1000.0 + 0.1)
        })
        .collect();
    let may = range("2024-05-01", "2024-05-31");
    let analyzer = PeakAnalyzer::new();

    let first = analyzer.analyze(&readings, &may).unwrap();
    let second = analyzer.analyze(&readings, &may).unwrap();

    assert_eq!(first, second);
    for (a, b) in first.hour_frequency.iter().zip(&second.hour_frequency) {
        assert_eq!(a.avg_peak_total.to_bits(), b.avg_peak_total.to_bits());
    }

    let mut shuffled = readings.clone();
    shuffled.reverse();
    shuffled.rotate_left(123);
    let third = analyzer.analyze(&shuffled, &may).unwrap();
    for (a, b) in first.buckets.iter().zip(&third.buckets) {
        assert_eq!(a.total.to_bits(), b.total.to_bits());
    }
    assert_eq!(first.daily_peaks, third.daily_peaks);
}

#[test]
fn test_frequency_from_daily_peaks_counts_days() {
    let readings = vec![
        reading("2024-05-01T19:00:00Z", 5.0),
        reading("2024-05-02T20:00:00Z", 5.0),
        reading("2024-05-03T19:00:00Z", 5.0),
        reading("2024-05-08T09:00:00Z", 5.0),
    ];

    let buckets = aggregate(&readings, &range("2024-05-01", "2024-05-31")).unwrap();
    let peaks = daily_peaks(&buckets);
    let freq = hour_frequency(&peaks);

    let total: u32 = freq.iter().map(|f| f.frequency).sum();
    assert_eq!(total as usize, peaks.len());
    assert_eq!(
        freq.iter().map(|f| f.hour).collect::<Vec<_>>(),
        vec![19, 9, 20]
    );
}
