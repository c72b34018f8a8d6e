//! # peakhour Core Library
//!
//! Finds, for each calendar day in a range, the hour at which aggregated
//! power readings peak, and summarizes how often each hour of day is the
//! peak. The `peakhour` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Aggregation**: raw readings summed into sparse (day, hour) buckets
//! - **Peak selection**: one peak hour per day (earliest hour wins ties),
//!   rolled up into a frequency table with average peak totals
//! - **Storage**: SQLite measurement table, CSV reading files and
//!   TOML-based configuration
//! - **Export / render**: CSV tables and plain-text charts
//!
//! The aggregation and peak selection functions are pure: they take an
//! already-materialized slice and never touch I/O.
//!
//! ## Key Components
//!
//! - [`PeakAnalyzer`]: runs the full pipeline over a [`ReadingRange`]
//! - [`SqliteReadingStore`] / [`CsvReadingSource`]: [`ReadingSource`]s
//! - [`Config`]: Application configuration management

pub mod aggregate;
pub mod analysis;
pub mod error;
pub mod export;
pub mod peaks;
pub mod reading;
pub mod render;
pub mod storage;

pub use aggregate::{aggregate, HourBucket};
pub use analysis::{PeakAnalysis, PeakAnalyzer, PeakSummary};
pub use error::{
    ConfigError, CoreError, DatabaseError, ExportError, RenderError, SourceError, ValidationError,
};
pub use peaks::{daily_peaks, hour_frequency, DailyPeak, HourFrequency};
pub use reading::{Reading, ReadingRange};
pub use render::{render_daily_peaks, render_heatmap, render_hour_frequency, HeatmapGrid};
pub use storage::{Config, CsvReadingSource, ReadingSource, SqliteReadingStore, TableSpec};
