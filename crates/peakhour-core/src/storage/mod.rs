mod config;
pub mod csv_source;
pub mod readings_db;

pub use config::{AnalysisConfig, Config, OutputConfig, SourceConfig};
pub use csv_source::CsvReadingSource;
pub use readings_db::{SqliteReadingStore, TableSpec};

use std::path::PathBuf;

use crate::error::Result;
use crate::reading::{Reading, ReadingRange};

/// Anything that can produce the readings for a range.
///
/// Implementations may return readings outside `range`; the aggregator
/// filters again, so the range here is a hint for narrowing I/O.
pub trait ReadingSource {
    /// Short description used in log lines.
    fn describe(&self) -> String;

    /// Fetch readings within `range`.
    fn fetch(&self, range: &ReadingRange) -> Result<Vec<Reading>>;
}

/// Returns `~/.config/peakhour[-dev]/` based on PEAKHOUR_ENV.
///
/// Set PEAKHOUR_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PEAKHOUR_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("peakhour-dev")
    } else {
        base_dir.join("peakhour")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
