//! Driver-level errors.

use thiserror::Error;

/// Result type alias for driver calls.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors raised by a document database driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A document or attribute that a query dereferenced does not exist
    #[error("Non-existence: {0}")]
    NonExistence(String),

    /// The database refused the operation (bad name, missing table, duplicate create)
    #[error("Operation failed: {0}")]
    OpFailed(String),

    /// Connection could not be established or is no longer usable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored document is not valid JSON
    #[error("Document JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverError {
    /// Whether the error is the "no such document/attribute" signal.
    pub fn is_non_existence(&self) -> bool {
        matches!(self, DriverError::NonExistence(_))
    }
}
