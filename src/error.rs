//! Error types for the Pharos feed personalization core
//!
//! This module provides comprehensive error handling using thiserror for
//! structured error definitions and anyhow for error propagation.

use thiserror::Error;

/// Main error type for Pharos operations
#[derive(Error, Debug)]
pub enum PharosError {
    /// Settings value outside the field's declared bounds.
    ///
    /// Raised at write time (the write is rejected, never clamped) and by
    /// the resolver when stored data is out of bounds, which indicates a
    /// write-path bug rather than bad input.
    #[error("value {value} for '{field}' is out of bounds ({min}..={max})")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Write targets a scope instance that doesn't exist
    #[error("unknown scope: {0}")]
    UnknownScope(String),

    /// Ranking parameters rejected at the call boundary
    #[error("invalid recency parameters: {0}")]
    InvalidRecencyParameters(String),

    /// A feedback write raced with a learning reset for the same user
    #[error("feedback write raced with reset-learning: {0}")]
    ConcurrentResetRace(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Requested entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid identifier format
    #[error("Invalid id: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Pharos operations
pub type Result<T> = std::result::Result<T, PharosError>;

impl From<libsql::Error> for PharosError {
    fn from(err: libsql::Error) -> Self {
        PharosError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to PharosError
impl From<anyhow::Error> for PharosError {
    fn from(err: anyhow::Error) -> Self {
        PharosError::Other(err.to_string())
    }
}
