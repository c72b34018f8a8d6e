//! Delimited-text export of the analysis tables.
//!
//! Column names follow the tables the analysis has always produced:
//! `date,peak_hour,total_power`, `peak_hour,frequency,avg_peak_power` and
//! `date,hour,total_power`.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregate::HourBucket;
use crate::error::ExportError;
use crate::peaks::{DailyPeak, HourFrequency};

#[derive(Serialize)]
struct DailyPeakRow {
    date: String,
    peak_hour: u8,
    total_power: f64,
}

#[derive(Serialize)]
struct HourFrequencyRow {
    peak_hour: u8,
    frequency: u32,
    avg_peak_power: f64,
}

#[derive(Serialize)]
struct HourBucketRow {
    date: String,
    hour: u8,
    total_power: f64,
}

fn write_rows<W: Write, R: Serialize>(
    writer: W,
    headers: &[&str],
    rows: impl IntoIterator<Item = R>,
) -> Result<(), ExportError> {
    // Explicit header so empty tables still carry their columns.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the per-day peak table.
pub fn write_daily_peaks<W: Write>(writer: W, peaks: &[DailyPeak]) -> Result<(), ExportError> {
    write_rows(
        writer,
        &["date", "peak_hour", "total_power"],
        peaks.iter().map(|p| DailyPeakRow {
            date: p.day.format("%Y-%m-%d").to_string(),
            peak_hour: p.peak_hour,
            total_power: p.total,
        }),
    )
}

/// Write the peak-hour frequency table.
pub fn write_hour_frequency<W: Write>(
    writer: W,
    rows: &[HourFrequency],
) -> Result<(), ExportError> {
    write_rows(
        writer,
        &["peak_hour", "frequency", "avg_peak_power"],
        rows.iter().map(|f| HourFrequencyRow {
            peak_hour: f.hour,
            frequency: f.frequency,
            avg_peak_power: f.avg_peak_total,
        }),
    )
}

/// Write every hourly total.
pub fn write_hour_buckets<W: Write>(writer: W, buckets: &[HourBucket]) -> Result<(), ExportError> {
    write_rows(
        writer,
        &["date", "hour", "total_power"],
        buckets.iter().map(|b| HourBucketRow {
            date: b.day.format("%Y-%m-%d").to_string(),
            hour: b.hour,
            total_power: b.total,
        }),
    )
}

fn save_with<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(std::fs::File) -> Result<(), ExportError>,
{
    let file = std::fs::File::create(path).map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write(file)?;
    info!(path = %path.display(), "saved table");
    Ok(())
}

pub fn save_daily_peaks(path: &Path, peaks: &[DailyPeak]) -> Result<(), ExportError> {
    save_with(path, |file| write_daily_peaks(file, peaks))
}

pub fn save_hour_frequency(path: &Path, rows: &[HourFrequency]) -> Result<(), ExportError> {
    save_with(path, |file| write_hour_frequency(file, rows))
}

pub fn save_hour_buckets(path: &Path, buckets: &[HourBucket]) -> Result<(), ExportError> {
    save_with(path, |file| write_hour_buckets(file, buckets))
}
