//! Readings from a `timestamp,value` CSV file.
//!
//! Unlike the database source, a malformed row is an error: a CSV file is
//! something the user can fix and rerun.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::Deserialize;
use tracing::debug;

use super::ReadingSource;
use crate::error::{Result, SourceError};
use crate::reading::{parse_timestamp, Reading, ReadingRange};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    value: f64,
}

/// CSV file with a header row and `timestamp` and `value` columns.
#[derive(Debug, Clone)]
pub struct CsvReadingSource {
    path: PathBuf,
    default_offset: FixedOffset,
}

impl CsvReadingSource {
    pub fn new(path: impl Into<PathBuf>, default_offset: FixedOffset) -> Self {
        Self {
            path: path.into(),
            default_offset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the file.
    ///
    /// # Errors
    /// Returns `SourceError` if the file cannot be opened or any row is
    /// malformed.
    pub fn read_all(&self) -> Result<Vec<Reading>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(source) => SourceError::OpenFailed {
                    path: self.path.clone(),
                    source,
                },
                other => SourceError::MalformedRecord {
                    line: 0,
                    message: format!("{other:?}"),
                },
            })?;

        let mut readings = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| SourceError::MalformedRecord {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;
            let timestamp = parse_timestamp(&row.timestamp, self.default_offset).map_err(|e| {
                SourceError::MalformedRecord {
                    // header is line 1
                    line: readings.len() as u64 + 2,
                    message: e.to_string(),
                }
            })?;
            readings.push(Reading {
                timestamp,
                value: row.value,
            });
        }

        debug!(path = %self.path.display(), rows = readings.len(), "read readings csv");
        Ok(readings)
    }
}

impl ReadingSource for CsvReadingSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn fetch(&self, range: &ReadingRange) -> Result<Vec<Reading>> {
        range.validate()?;
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| range.contains(&r.timestamp))
            .collect())
    }
}
