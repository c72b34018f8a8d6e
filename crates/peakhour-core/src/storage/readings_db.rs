//! SQLite-backed measurement table.
//!
//! Readings live in a single table with a TEXT timestamp column and a REAL
//! value column. Table and column names come from configuration, so they
//! are validated as plain identifiers before being spliced into SQL.

use std::path::{Path, PathBuf};

use chrono::{Days, FixedOffset, SecondsFormat};
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, warn};

use super::{ReadingSource, SourceConfig};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::reading::{parse_timestamp, utc, Reading, ReadingRange};

/// Local dates of stored timestamps may differ from the range bounds' local
/// dates by up to this many days once offsets are taken into account.
const DATE_SLACK_DAYS: u64 = 2;

/// Where readings are stored within the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub table: String,
    pub timestamp_column: String,
    pub value_column: String,
    /// Offset for timestamps stored without one
    pub default_offset: FixedOffset,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            table: "dispatcher".into(),
            timestamp_column: "settlement_date".into(),
            value_column: "scada_value".into(),
            default_offset: utc(),
        }
    }
}

impl TableSpec {
    /// Build a spec, rejecting names that are not plain SQL identifiers.
    pub fn new(
        table: &str,
        timestamp_column: &str,
        value_column: &str,
        default_offset: FixedOffset,
    ) -> Result<Self, ValidationError> {
        for (field, name) in [
            ("table", table),
            ("timestamp_column", timestamp_column),
            ("value_column", value_column),
        ] {
            check_identifier(field, name)?;
        }
        Ok(Self {
            table: table.to_string(),
            timestamp_column: timestamp_column.to_string(),
            value_column: value_column.to_string(),
            default_offset,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(
            &config.table,
            &config.timestamp_column,
            &config.value_column,
            config.offset()?,
        )?)
    }
}

fn check_identifier(field: &str, name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("'{name}' is not a valid SQL identifier"),
        })
    }
}

/// SQLite database holding one measurement table.
pub struct SqliteReadingStore {
    conn: Connection,
    spec: TableSpec,
    path: Option<PathBuf>,
}

impl SqliteReadingStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Open the database at `path`, creating the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path, spec: TableSpec) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            spec,
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        debug!(path = %path.display(), table = %store.spec.table, "opened readings database");
        Ok(store)
    }

    /// Open an existing database read-only, without touching its schema.
    ///
    /// Used for analysis over a measurement table owned by someone else.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_existing(path: &Path, spec: TableSpec) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| DatabaseError::OpenFailed {
                path: path.to_path_buf(),
                source,
            },
        )?;
        debug!(
            path = %path.display(),
            table = %spec.table,
            "opened readings database read-only"
        );
        Ok(Self {
            conn,
            spec,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory(spec: TableSpec) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let store = Self {
            conn,
            spec,
            path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        let TableSpec {
            table,
            timestamp_column: ts,
            value_column: val,
            ..
        } = &self.spec;
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {ts}  TEXT NOT NULL,
                {val} REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_{ts} ON {table}({ts});"
        ))?;
        Ok(())
    }

    /// Insert readings in a single transaction. Returns the number written.
    ///
    /// # Errors
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn insert_readings(&mut self, readings: &[Reading]) -> Result<usize> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            self.spec.table, self.spec.timestamp_column, self.spec.value_column
        );
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        {
            let mut stmt = tx.prepare(&sql).map_err(DatabaseError::from)?;
            for reading in readings {
                stmt.execute(params![
                    reading
                        .timestamp
                        .to_rfc3339_opts(SecondsFormat::AutoSi, false),
                    reading.value,
                ])
                .map_err(DatabaseError::from)?;
            }
        }
        tx.commit().map_err(DatabaseError::from)?;
        info!(count = readings.len(), table = %self.spec.table, "inserted readings");
        Ok(readings.len())
    }

    /// Number of rows in the measurement table.
    pub fn count(&self) -> Result<u64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.spec.table), [], |row| {
                row.get::<_, u64>(0)
            })
            .map_err(DatabaseError::from)?;
        Ok(count)
    }
}

impl ReadingSource for SqliteReadingStore {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{} ({})", path.display(), self.spec.table),
            None => format!("sqlite:memory ({})", self.spec.table),
        }
    }

    fn fetch(&self, range: &ReadingRange) -> Result<Vec<Reading>> {
        range.validate()?;

        let TableSpec {
            table,
            timestamp_column: ts,
            value_column: val,
            default_offset,
        } = &self.spec;
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ts}, {val} FROM {table}
                 WHERE substr(trim({ts}), 1, 10) BETWEEN ?1 AND ?2
                 ORDER BY trim({ts})"
            ))
            .map_err(DatabaseError::from)?;

        let lo = range
            .start
            .date_naive()
            .checked_sub_days(Days::new(DATE_SLACK_DAYS))
            .unwrap_or(range.start.date_naive());
        let hi = range
            .end
            .date_naive()
            .checked_add_days(Days::new(DATE_SLACK_DAYS))
            .unwrap_or(range.end.date_naive());

        let rows = stmt
            .query_map(
                params![lo.format("%Y-%m-%d").to_string(), hi.format("%Y-%m-%d").to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?)),
            )
            .map_err(DatabaseError::from)?;

        let mut readings = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (raw, value) = row.map_err(DatabaseError::from)?;
            let Some(value) = value else {
                skipped += 1;
                warn!(timestamp = %raw, "skipping row with NULL value");
                continue;
            };
            match parse_timestamp(&raw, *default_offset) {
                Ok(timestamp) if range.contains(&timestamp) => {
                    readings.push(Reading { timestamp, value })
                }
                Ok(_) => {}
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "skipping row with unparsable timestamp");
                }
            }
        }

        debug!(
            source = %self.describe(),
            fetched = readings.len(),
            skipped,
            "fetched readings"
        );
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::parse_date;

    fn reading(ts: &str, value: f64) -> Reading {
        Reading::new(parse_timestamp(ts, utc()).unwrap(), value)
    }

    fn may() -> ReadingRange {
        ReadingRange::from_dates(
            parse_date("2024-05-01").unwrap(),
            parse_date("2024-05-31").unwrap(),
            utc(),
        )
        .unwrap()
    }

    #[test]
    fn test_identifier_validation() {
        assert!(TableSpec::new("dispatcher", "SETTLEMENTDATE", "SCADAVALUE", utc()).is_ok());
        assert!(TableSpec::new("_t1", "a", "b", utc()).is_ok());
        assert!(TableSpec::new("1table", "a", "b", utc()).is_err());
        assert!(TableSpec::new("t; DROP TABLE x", "a", "b", utc()).is_err());
        assert!(TableSpec::new("t", "", "b", utc()).is_err());
    }

    #[test]
    fn test_insert_and_fetch_in_range() {
        let mut store = SqliteReadingStore::open_memory(TableSpec::default()).unwrap();
        store
            .insert_readings(&[
                reading("2024-04-30T23:00:00Z", 1.0),
                reading("2024-05-01T00:00:00Z", 2.0),
                reading("2024-05-15T12:30:00Z", 3.0),
                reading("2024-06-01T00:00:00Z", 4.0),
            ])
            .unwrap();

        assert_eq!(store.count().unwrap(), 4);

        let fetched = store.fetch(&may()).unwrap();
        let values: Vec<f64> = fetched.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_fetch_preserves_offsets() {
        let mut store = SqliteReadingStore::open_memory(TableSpec::default()).unwrap();
        let original = reading("2024-05-01T19:15:00.5+07:00", 10.0);
        store.insert_readings(&[original]).unwrap();

        let fetched = store.fetch(&may()).unwrap();
        assert_eq!(fetched, vec![original]);
    }

    #[test]
    fn test_fetch_naive_rows_and_skips_garbage() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let spec = TableSpec::new("dispatcher", "SETTLEMENTDATE", "SCADAVALUE", offset).unwrap();
        let store = SqliteReadingStore::open_memory(spec).unwrap();
        store
            .conn()
            .execute_batch(
                "INSERT INTO dispatcher VALUES ('2024-05-01 19:00:00', 5);
                 INSERT INTO dispatcher VALUES ('2024-05-01 not a time', 6);",
            )
            .unwrap();

        let range = ReadingRange::from_dates(
            parse_date("2024-05-01").unwrap(),
            parse_date("2024-05-01").unwrap(),
            offset,
        )
        .unwrap();
        let fetched = store.fetch(&range).unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].value, 5.0);
        assert_eq!(fetched[0].timestamp.offset(), &offset);
    }

    #[test]
    fn test_fetch_rejects_reversed_range() {
        let store = SqliteReadingStore::open_memory(TableSpec::default()).unwrap();
        let range = ReadingRange {
            start: may().end,
            end: may().start,
        };
        assert!(store.fetch(&range).is_err());
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("readings.db");
        {
            let mut store = SqliteReadingStore::open(&path, TableSpec::default()).unwrap();
            store.insert_readings(&[reading("2024-05-02T08:00:00Z", 1.5)]).unwrap();
        }

        let store = SqliteReadingStore::open(&path, TableSpec::default()).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.describe().contains("dispatcher"));
    }

    fn nullable_table(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("external.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE dispatcher (settlement_date TEXT, scada_value REAL);
             INSERT INTO dispatcher VALUES ('2024-05-01 19:00:00', 1500);
             INSERT INTO dispatcher VALUES ('2024-05-01 19:05:00', NULL);
             INSERT INTO dispatcher VALUES ('  2024-05-02 08:00:00', 20);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_fetch_skips_null_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = nullable_table(&dir);

        let store = SqliteReadingStore::open_existing(&path, TableSpec::default()).unwrap();
        let fetched = store.fetch(&may()).unwrap();

        let values: Vec<f64> = fetched.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1500.0, 20.0]);
    }

    #[test]
    fn test_fetch_matches_padded_timestamps() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = nullable_table(&dir);
        let store = SqliteReadingStore::open_existing(&path, TableSpec::default()).unwrap();

        let range = ReadingRange::from_dates(
            parse_date("2024-05-02").unwrap(),
            parse_date("2024-05-02").unwrap(),
            utc(),
        )
        .unwrap();
        let fetched = store.fetch(&range).unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].value, 20.0);
    }

    #[test]
    fn test_open_existing_leaves_schema_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = nullable_table(&dir);

        let mut store = SqliteReadingStore::open_existing(&path, TableSpec::default()).unwrap();
        store.fetch(&may()).unwrap();
        assert!(store
            .insert_readings(&[reading("2024-05-03T00:00:00Z", 1.0)])
            .is_err());
        drop(store);

        let conn = Connection::open(&path).unwrap();
        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 0);
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");

        assert!(SqliteReadingStore::open_existing(&path, TableSpec::default()).is_err());
        assert!(!path.exists());
    }
}
