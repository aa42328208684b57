//! Custom error types for GameVault backups
//!
//! This module defines the error hierarchy for the backup tool using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for backup and restore operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Missing or malformed configuration, detected before any work starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Archive compression/extraction errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Object storage request failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// A bucket could not be verified or created
    #[error("Bucket error: {0}")]
    Bucket(String),

    /// Database driver errors
    #[error("Database error: {0}")]
    Database(String),

    /// A native dump/restore tool ran but failed or timed out
    #[error("Tool error: {0}")]
    Tool(String),

    /// A native tool is required but not installed
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// A restore date that is not YYYY-MM-DD
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Validation errors for records
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Nothing has been uploaded under the backup prefix yet
    #[error("No backups available to restore")]
    NoBackups,
}

impl BackupError {
    /// Create a "not found" error for a named backup artifact
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoBackups)
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for BackupError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for BackupError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<mongodb::error::Error> for BackupError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
