//! End-to-end peak-hour analysis.
//!
//! [`PeakAnalyzer`] runs aggregation, daily peak selection and the
//! frequency rollup over an already-materialized slice of readings and
//! bundles the three tables into a [`PeakAnalysis`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{aggregate, HourBucket};
use crate::error::ValidationError;
use crate::peaks::{daily_peaks, hour_frequency, DailyPeak, HourFrequency};
use crate::reading::{Reading, ReadingRange};

/// Output tables of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakAnalysis {
    pub range: ReadingRange,
    /// Number of readings that fell inside the range
    pub readings_used: usize,
    pub buckets: Vec<HourBucket>,
    pub daily_peaks: Vec<DailyPeak>,
    pub hour_frequency: Vec<HourFrequency>,
}

impl PeakAnalysis {
    /// True when no reading fell inside the range.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Summarize the run for the console report.
    pub fn summary(&self, evening: (u8, u8)) -> PeakSummary {
        let top = self.hour_frequency.first().map(|f| f.frequency).unwrap_or(0);
        let dominant_hours = self
            .hour_frequency
            .iter()
            .take_while(|f| f.frequency == top)
            .map(|f| f.hour)
            .collect();

        let (from, to) = evening;
        let in_evening = |hour: u8| hour >= from && hour <= to;
        let evening_days = self
            .daily_peaks
            .iter()
            .filter(|p| in_evening(p.peak_hour))
            .count();
        let outlier_days = self
            .daily_peaks
            .iter()
            .filter(|p| !in_evening(p.peak_hour))
            .map(|p| (p.day, p.peak_hour))
            .collect();

        PeakSummary {
            days_analyzed: self.daily_peaks.len(),
            readings_used: self.readings_used,
            total_energy: self.buckets.iter().map(|b| b.total).sum(),
            dominant_hours,
            dominant_frequency: top,
            evening_window: evening,
            evening_days,
            outlier_days,
        }
    }
}

/// Headline figures of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    pub days_analyzed: usize,
    pub readings_used: usize,
    /// Sum of every hourly total in the range
    pub total_energy: f64,
    /// Hours sharing the highest peak frequency, ascending
    pub dominant_hours: Vec<u8>,
    pub dominant_frequency: u32,
    /// Inclusive hour window treated as the usual peak period
    pub evening_window: (u8, u8),
    /// Days whose peak fell inside the evening window
    pub evening_days: usize,
    /// Days whose peak fell outside the evening window, with their peak hour
    pub outlier_days: Vec<(NaiveDate, u8)>,
}

impl PeakSummary {
    /// Render the summary as report lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Days analyzed: {}", self.days_analyzed),
            format!("Readings used: {}", self.readings_used),
            format!("Total energy: {:.0}", self.total_energy),
        ];

        if self.days_analyzed == 0 {
            lines.push("No peak hours found in range.".to_string());
            return lines;
        }

        let hours: Vec<String> = self.dominant_hours.iter().map(|h| format!("{h:02}:00")).collect();
        lines.push(format!(
            "Most frequent peak hour: {} ({} days)",
            hours.join(", "),
            self.dominant_frequency
        ));
        lines.push(format!(
            "Peaks within {:02}:00-{:02}:00: {}/{} days",
            self.evening_window.0, self.evening_window.1, self.evening_days, self.days_analyzed
        ));
        for (day, hour) in &self.outlier_days {
            lines.push(format!("  Outlier: {} peaked at {:02}:00", day.format("%Y-%m-%d"), hour));
        }
        lines
    }
}

/// Runs the peak-hour pipeline.
#[derive(Debug, Clone)]
pub struct PeakAnalyzer {
    /// Inclusive hour window considered the normal peak period
    pub evening_window: (u8, u8),
}

impl Default for PeakAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakAnalyzer {
    /// Create an analyzer with the default 17:00-20:00 evening window.
    pub fn new() -> Self {
        Self {
            evening_window: (17, 20),
        }
    }

    pub fn with_evening_window(mut self, from: u8, to: u8) -> Self {
        self.evening_window = (from, to);
        self
    }

    /// Aggregate `readings` over `range` and derive both peak tables.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidRange` if the range is reversed.
    pub fn analyze(
        &self,
        readings: &[Reading],
        range: &ReadingRange,
    ) -> Result<PeakAnalysis, ValidationError> {
        let buckets = aggregate(readings, range)?;
        let daily_peaks = daily_peaks(&buckets);
        let hour_frequency = hour_frequency(&daily_peaks);
        let readings_used = readings
            .iter()
            .filter(|r| range.contains(&r.timestamp))
            .count();

        debug!(
            buckets = buckets.len(),
            days = daily_peaks.len(),
            hours = hour_frequency.len(),
            "peak analysis complete"
        );
        info!(
            start = %range.start,
            end = %range.end,
            readings = readings_used,
            days = daily_peaks.len(),
            "analyzed readings"
        );

        Ok(PeakAnalysis {
            range: *range,
            readings_used,
            buckets,
            daily_peaks,
            hour_frequency,
        })
    }

    /// Summarize `analysis` using this analyzer's evening window.
    pub fn summarize(&self, analysis: &PeakAnalysis) -> PeakSummary {
        analysis.summary(self.evening_window)
    }
}
