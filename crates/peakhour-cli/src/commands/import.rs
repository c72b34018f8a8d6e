//! Load a readings CSV into the SQLite measurement table.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use peakhour_core::reading::parse_offset;
use peakhour_core::{Config, CsvReadingSource, SqliteReadingStore, TableSpec};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file with timestamp,value columns
    pub file: PathBuf,
    /// SQLite database to write into, defaults to source.database
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// UTC offset for timestamps without one (e.g. +07:00)
    #[arg(long)]
    pub offset: Option<String>,
}

pub fn run(args: ImportArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let offset = match &args.offset {
        Some(raw) => parse_offset(raw)?,
        None => config.source.offset()?,
    };
    let readings = CsvReadingSource::new(&args.file, offset).read_all()?;

    let path = match args.db {
        Some(path) => path,
        None => config.source.database_path()?,
    };
    let mut store = SqliteReadingStore::open(&path, TableSpec::from_config(&config.source)?)?;
    let written = store.insert_readings(&readings)?;
    let total = store.count()?;

    info!(file = %args.file.display(), written, "import complete");
    println!(
        "Imported {written} readings into {} ({} rows total)",
        path.display(),
        total
    );
    Ok(())
}
