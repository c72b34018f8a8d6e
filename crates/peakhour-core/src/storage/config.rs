//! TOML-based application configuration.
//!
//! Stores:
//! - Where readings come from (SQLite path, table and column names, offset)
//! - Where tables and charts are written
//! - Default analysis range and evening window
//!
//! Configuration is stored at `~/.config/peakhour/config.toml`.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::ConfigError;
use crate::reading::{parse_date, parse_offset};

/// Reading source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// SQLite database path. Defaults to `<data dir>/readings.db`.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Offset applied to timestamps stored without one.
    #[serde(default = "default_offset")]
    pub default_offset: String,
}

/// Output file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_peaks_csv")]
    pub peaks_csv: String,
    #[serde(default = "default_frequency_csv")]
    pub frequency_csv: String,
    #[serde(default = "default_peaks_chart")]
    pub peaks_chart: String,
    #[serde(default = "default_frequency_chart")]
    pub frequency_chart: String,
    #[serde(default = "default_heatmap_chart")]
    pub heatmap_chart: String,
    /// Render the day x hour heatmap after the main tables.
    #[serde(default = "default_true")]
    pub heatmap: bool,
}

/// Analysis defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
    #[serde(default = "default_evening_start")]
    pub evening_start: u8,
    #[serde(default = "default_evening_end")]
    pub evening_end: u8,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/peakhour/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// Default functions
fn default_table() -> String {
    "dispatcher".into()
}
fn default_timestamp_column() -> String {
    "settlement_date".into()
}
fn default_value_column() -> String {
    "scada_value".into()
}
fn default_offset() -> String {
    "+00:00".into()
}
fn default_directory() -> String {
    ".".into()
}
fn default_peaks_csv() -> String {
    "peak_hours_by_day.csv".into()
}
fn default_frequency_csv() -> String {
    "peak_hour_frequency.csv".into()
}
fn default_peaks_chart() -> String {
    "peak_hours_by_day.txt".into()
}
fn default_frequency_chart() -> String {
    "peak_hour_frequency.txt".into()
}
fn default_heatmap_chart() -> String {
    "power_heatmap.txt".into()
}
fn default_true() -> bool {
    true
}
fn default_start_date() -> String {
    "2024-05-01".into()
}
fn default_end_date() -> String {
    "2024-05-31".into()
}
fn default_evening_start() -> u8 {
    17
}
fn default_evening_end() -> u8 {
    20
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database: None,
            table: default_table(),
            timestamp_column: default_timestamp_column(),
            value_column: default_value_column(),
            default_offset: default_offset(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            peaks_csv: default_peaks_csv(),
            frequency_csv: default_frequency_csv(),
            peaks_chart: default_peaks_chart(),
            frequency_chart: default_frequency_chart(),
            heatmap_chart: default_heatmap_chart(),
            heatmap: true,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            evening_start: default_evening_start(),
            evening_end: default_evening_end(),
        }
    }
}

impl SourceConfig {
    /// Parsed `default_offset`.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.default_offset).map_err(|e| ConfigError::InvalidValue {
            key: "source.default_offset".into(),
            message: e.to_string(),
        })
    }

    /// Database path, falling back to `<data dir>/readings.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => Ok(PathBuf::from(path)),
            None => data_dir()
                .map(|dir| dir.join("readings.db"))
                .map_err(|e| ConfigError::InvalidValue {
                    key: "source.database".into(),
                    message: e.to_string(),
                }),
        }
    }
}

impl AnalysisConfig {
    /// Parsed default start and end dates.
    pub fn dates(&self) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let parse = |key: &str, raw: &str| {
            parse_date(raw).map_err(|e| ConfigError::InvalidValue {
                key: key.into(),
                message: e.to_string(),
            })
        };
        Ok((
            parse("analysis.start_date", &self.start_date)?,
            parse("analysis.end_date", &self.end_date)?,
        ))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("'{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|e| invalid(format!("'{value}': {e}")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the default config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from `path`, or return defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                debug!(path = %path.display(), "loaded configuration");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check values that serde alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.offset()?;
        self.analysis.dates()?;
        let (from, to) = (self.analysis.evening_start, self.analysis.evening_end);
        if from > 23 || to > 23 || from > to {
            return Err(ConfigError::InvalidValue {
                key: "analysis.evening_start".into(),
                message: format!("evening window {from}-{to} must lie within 0-23 and be ordered"),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
