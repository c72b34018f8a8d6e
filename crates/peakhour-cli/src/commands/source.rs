//! Range and source selection shared by the analysis commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::info;

use peakhour_core::reading::{parse_date, parse_offset};
use peakhour_core::{
    Config, CsvReadingSource, Reading, ReadingRange, ReadingSource, SqliteReadingStore, TableSpec,
};

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First day of the range (YYYY-MM-DD), defaults to analysis.start_date
    #[arg(long)]
    pub start: Option<String>,
    /// Last day of the range, inclusive (YYYY-MM-DD), defaults to analysis.end_date
    #[arg(long)]
    pub end: Option<String>,
    /// Read readings from a timestamp,value CSV file instead of the database
    #[arg(long, conflicts_with = "db")]
    pub csv: Option<PathBuf>,
    /// SQLite database to read from, defaults to source.database
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// UTC offset of the range and of naive timestamps (e.g. +07:00)
    #[arg(long)]
    pub offset: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl RangeArgs {
    /// Resolve the inclusive range from flags, falling back to config.
    pub fn range(&self, config: &Config) -> Result<ReadingRange, Box<dyn std::error::Error>> {
        let (default_start, default_end) = config.analysis.dates()?;
        let start = match &self.start {
            Some(raw) => parse_date(raw)?,
            None => default_start,
        };
        let end = match &self.end {
            Some(raw) => parse_date(raw)?,
            None => default_end,
        };
        Ok(ReadingRange::from_dates(start, end, self.offset(config)?)?)
    }

    fn offset(&self, config: &Config) -> Result<chrono::FixedOffset, Box<dyn std::error::Error>> {
        Ok(match &self.offset {
            Some(raw) => parse_offset(raw)?,
            None => config.source.offset()?,
        })
    }

    /// Open the reading source selected by flags and config.
    pub fn source(
        &self,
        config: &Config,
    ) -> Result<Box<dyn ReadingSource>, Box<dyn std::error::Error>> {
        let offset = self.offset(config)?;
        if let Some(path) = &self.csv {
            return Ok(Box::new(CsvReadingSource::new(path, offset)));
        }

        let mut spec = TableSpec::from_config(&config.source)?;
        spec.default_offset = offset;
        let path = match &self.db {
            Some(path) => path.clone(),
            None => config.source.database_path()?,
        };
        if !path.exists() {
            return Err(format!("database not found: {}", path.display()).into());
        }
        Ok(Box::new(SqliteReadingStore::open_existing(&path, spec)?))
    }

    /// Resolve the range and fetch its readings.
    pub fn load(
        &self,
        config: &Config,
    ) -> Result<(ReadingRange, Vec<Reading>), Box<dyn std::error::Error>> {
        let range = self.range(config)?;
        let source = self.source(config)?;
        let readings = source.fetch(&range)?;
        info!(source = %source.describe(), readings = readings.len(), "loaded readings");
        Ok((range, readings))
    }
}
