//! Core error types for peakhour-core.
//!
//! This module defines the error hierarchy using thiserror. Empty results
//! are never errors: an empty reading set flows through every stage and
//! yields empty tables.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for peakhour-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Reading source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Range start lies after range end
    #[error("Invalid range: start ({start}) must not be after end ({end})")]
    InvalidRange {
        start: chrono::DateTime<chrono::FixedOffset>,
        end: chrono::DateTime<chrono::FixedOffset>,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while pulling readings from a source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to open the source file
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV record
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    /// Timestamp could not be parsed
    #[error("Unrecognised timestamp '{0}'")]
    BadTimestamp(String),
}

/// Errors raised while writing CSV tables.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to write the table
    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by chart rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Nothing to draw
    #[error("No hourly totals to plot")]
    EmptyGrid,
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Export(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
