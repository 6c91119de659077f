//! Error types module
//!
//! `FilesError` covers everything that can go wrong around a record's file
//! slots apart from the blob store itself: unpersisted records, persistence
//! failures of the slot columns, bad column names and configuration.
//! Disk errors live in `tether-storage` and are combined with this type by
//! the attachment helper.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata a host application uses to classify and log an error
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "MODEL_NOT_PERSISTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("The model must be persisted before performing file actions.")]
    ModelNotPersisted,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for FilesError {
    fn from(err: anyhow::Error) -> Self {
        FilesError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for FilesError {
    fn from(err: SqlxError) -> Self {
        FilesError::Database(err)
    }
}

impl From<envy::Error> for FilesError {
    fn from(err: envy::Error) -> Self {
        FilesError::Config(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn files_error_static_metadata(err: &FilesError) -> (&'static str, bool, LogLevel) {
    match err {
        FilesError::ModelNotPersisted => ("MODEL_NOT_PERSISTED", false, LogLevel::Debug),
        FilesError::Persistence(_) => ("PERSISTENCE_ERROR", true, LogLevel::Error),
        #[cfg(feature = "sqlx")]
        FilesError::Database(_) => ("DATABASE_ERROR", true, LogLevel::Error),
        FilesError::InvalidColumn(_) => ("INVALID_COLUMN", false, LogLevel::Debug),
        FilesError::InvalidUpload(_) => ("INVALID_UPLOAD", false, LogLevel::Debug),
        FilesError::Config(_) => ("CONFIGURATION_ERROR", false, LogLevel::Error),
        FilesError::Io(_) => ("IO_ERROR", true, LogLevel::Error),
        FilesError::Internal(_) | FilesError::InternalWithSource { .. } => {
            ("INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl FilesError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for FilesError {
    fn error_code(&self) -> &'static str {
        files_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        files_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        files_error_static_metadata(self).2
    }
}
