//! Error types for list-splitter
//!
//! This module defines the error hierarchy for the exporter:
//! - Source fetch errors (SQLite and the psql subprocess)
//! - Configuration and CLI errors
//! - Output emission errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what failed
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the list-splitter application
#[derive(Error, Debug)]
pub enum ExportError {
    /// Source fetch errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output emission errors
    #[error("Output error: {0}")]
    Emit(#[from] EmitError),

    /// Worker pool errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Errors while fetching rows from the source database
#[derive(Error, Debug)]
pub enum SourceError {
    /// SQLite query error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// SQLite database could not be opened
    #[error("Failed to open SQLite database '{}': {reason}", .path.display())]
    OpenFailed { path: PathBuf, reason: String },

    /// psql client binary is not installed
    #[error("psql client not found - install the PostgreSQL client tools or use a SQLite source")]
    PsqlNotFound,

    /// psql could not be started
    #[error("Failed to run psql: {0}")]
    PsqlSpawnFailed(String),

    /// psql exited with a non-zero status
    #[error("psql failed ({code}): {stderr}")]
    PsqlFailed { code: i32, stderr: String },

    /// Malformed CSV in a COPY response
    #[error("Malformed COPY output: {0}")]
    Csv(#[from] csv::Error),

    /// Expected column missing from a query result
    #[error("Column '{column}' missing from query result")]
    MissingColumn { column: String },

    /// The source contains no list rows
    #[error("No lists found in source database")]
    NoLists,

    /// The source contains no item rows
    #[error("No items found in source database")]
    NoItems,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Source URL could not be parsed
    #[error("Invalid source '{url}': {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    /// SQLite source file does not exist
    #[error("SQLite database not found: '{}'", .path.display())]
    SqliteNotFound { path: PathBuf },

    /// Chunk size outside the accepted range
    #[error("Invalid chunk size {size}: must be between {min} and {max}")]
    InvalidChunkSize { size: usize, min: usize, max: usize },

    /// Worker count outside the accepted range
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// List limit must keep at least one list
    #[error("Invalid list limit: must be at least 1")]
    InvalidListLimit,
}

/// Errors while writing output files
#[derive(Error, Debug)]
pub enum EmitError {
    /// Output directory could not be created
    #[error("Failed to create output directory '{}': {reason}", .path.display())]
    CreateDirFailed { path: PathBuf, reason: String },

    /// Destination has no parent directory to stage the temp file in
    #[error("Cannot determine parent directory for '{}'", .path.display())]
    NoParentDir { path: PathBuf },

    /// Temporary file creation failed
    #[error("Failed to create temporary file in '{}': {reason}", .dir.display())]
    TempFileFailed { dir: PathBuf, reason: String },

    /// Write or flush failed
    #[error("Failed to write '{}': {reason}", .path.display())]
    WriteFailed { path: PathBuf, reason: String },

    /// Atomic rename onto the final path failed
    #[error("Failed to persist '{}': {reason}", .path.display())]
    PersistFailed { path: PathBuf, reason: String },
}

/// Worker pool errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker thread panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// The pool lost results mid-batch
    #[error("Normalization lost {missing} of {expected} rows")]
    ResultsIncomplete { expected: usize, missing: usize },
}

/// Result type alias for ExportError
pub type Result<T> = std::result::Result<T, ExportError>;

/// Result type alias for SourceError
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for EmitError
pub type EmitResult<T> = std::result::Result<T, EmitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidChunkSize {
            size: 0,
            min: 1,
            max: 1_000_000,
        };
        assert!(err.to_string().contains("chunk size 0"));

        let err = SourceError::MissingColumn {
            column: "borrower_id".to_string(),
        };
        assert!(err.to_string().contains("borrower_id"));
    }

    #[test]
    fn test_error_conversion() {
        let source_err = SourceError::NoLists;
        let export_err: ExportError = source_err.into();
        assert!(matches!(export_err, ExportError::Source(SourceError::NoLists)));

        let emit_err = EmitError::NoParentDir {
            path: PathBuf::from("/"),
        };
        let export_err: ExportError = emit_err.into();
        assert!(matches!(export_err, ExportError::Emit(_)));
    }

    #[test]
    fn test_psql_failure_message() {
        let err = SourceError::PsqlFailed {
            code: 2,
            stderr: "FATAL: database \"missing\" does not exist".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("psql failed (2)"));
        assert!(msg.contains("does not exist"));
    }
}
