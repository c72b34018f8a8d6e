//! Plain-text charts for terminal output and chart files.
//!
//! - Per-day bar chart of peak totals, annotated with the peak hour
//! - Bar chart of peak-hour frequency, annotated with the average peak
//! - Day x hour heatmap of every hourly total

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::aggregate::HourBucket;
use crate::error::RenderError;
use crate::peaks::{DailyPeak, HourFrequency};

const BAR_WIDTH: usize = 40;
const RULE_WIDTH: usize = 72;

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 && value > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    let len = len.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(len), " ".repeat(BAR_WIDTH - len))
}

fn header(title: &str) -> String {
    format!("\n{title}\n{}\n", "=".repeat(RULE_WIDTH))
}

/// Render one bar per day, scaled to the largest peak.
pub fn render_daily_peaks(peaks: &[DailyPeak]) -> String {
    let mut output = header("Peak Hour by Day");

    if peaks.is_empty() {
        output.push_str("No daily peak data available.\n");
        return output;
    }

    let max = peaks.iter().map(|p| p.total).fold(f64::MIN, f64::max);
    for peak in peaks {
        output.push_str(&format!(
            "{} {} {:>10.0} @ {:02}:00\n",
            peak.day.format("%d-%m"),
            bar(peak.total, max),
            peak.total,
            peak.peak_hour
        ));
    }

    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\nBar: total power in the peak hour | @: peak hour\n");
    output
}

/// Render one bar per peak hour, scaled to the highest frequency.
pub fn render_hour_frequency(rows: &[HourFrequency]) -> String {
    let mut output = header("Peak Hour Frequency");

    if rows.is_empty() {
        output.push_str("No peak hour frequency data available.\n");
        return output;
    }

    let max = rows.iter().map(|r| r.frequency).max().unwrap_or(0) as f64;
    for row in rows {
        output.push_str(&format!(
            "{:02}:00 {} {:>3} days  avg {:.0}\n",
            row.hour,
            bar(row.frequency as f64, max),
            row.frequency,
            row.avg_peak_total
        ));
    }

    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\nBar: days peaking at this hour | avg: mean peak power\n");
    output
}

/// Hourly totals arranged as hour rows by day columns.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    pub days: Vec<NaiveDate>,
    cells: BTreeMap<(NaiveDate, u8), f64>,
    min: f64,
    max: f64,
}

impl HeatmapGrid {
    /// Build the grid from hourly buckets.
    ///
    /// # Errors
    /// Returns `RenderError::EmptyGrid` if there are no finite totals.
    pub fn from_buckets(buckets: &[HourBucket]) -> Result<Self, RenderError> {
        let cells: BTreeMap<(NaiveDate, u8), f64> = buckets
            .iter()
            .filter(|b| b.total.is_finite())
            .map(|b| ((b.day, b.hour), b.total))
            .collect();
        if cells.is_empty() {
            return Err(RenderError::EmptyGrid);
        }

        let days: BTreeSet<NaiveDate> = cells.keys().map(|(day, _)| *day).collect();
        let min = cells.values().copied().fold(f64::INFINITY, f64::min);
        let max = cells.values().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            days: days.into_iter().collect(),
            cells,
            min,
            max,
        })
    }

    pub fn get(&self, day: NaiveDate, hour: u8) -> Option<f64> {
        self.cells.get(&(day, hour)).copied()
    }

    /// Position of `value` between the grid's min and max (0.0-1.0).
    pub fn intensity(&self, value: f64) -> f64 {
        if self.max > self.min {
            ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Glyph for a cell; blank when the hour has no readings.
    pub fn heat_char(&self, day: NaiveDate, hour: u8) -> char {
        match self.get(day, hour) {
            None => ' ',
            Some(value) => match self.intensity(value) {
                i if i <= 0.25 => '░',
                i if i <= 0.5 => '▒',
                i if i <= 0.75 => '▓',
                _ => '█',
            },
        }
    }

    /// Render as ASCII art, one row per hour and one column per day.
    pub fn render(&self) -> String {
        let mut output = header("Power Heatmap by Hour and Day");

        if let (Some(first), Some(last)) = (self.days.first(), self.days.last()) {
            output.push_str(&format!(
                "{} to {} | min {:.0} | max {:.0}\n\n",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d"),
                self.min,
                self.max
            ));
        }

        // Header row with day of month
        output.push_str("      ");
        for day in &self.days {
            output.push_str(&format!("{:>2} ", day.day()));
        }
        output.push('\n');

        for hour in 0..24u8 {
            output.push_str(&format!("{:02}:00 ", hour));
            for day in &self.days {
                output.push(' ');
                output.push(self.heat_char(*day, hour));
                output.push(' ');
            }
            output.push('\n');
        }

        output.push('\n');
        output.push_str(
            "Legend: ░ (0-25%) ▒ (25-50%) ▓ (50-75%) █ (75-100%) of range, blank = no data\n",
        );
        output
    }
}

/// Build and render the day x hour heatmap.
pub fn render_heatmap(buckets: &[HourBucket]) -> Result<String, RenderError> {
    Ok(HeatmapGrid::from_buckets(buckets)?.render())
}
