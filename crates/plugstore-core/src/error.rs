//! Error types for Plugstore core operations.
//!
//! `MissingKey` is the only error normalized from a driver signal; every
//! other driver failure is carried through untouched in `Driver`.

use thiserror::Error;

use crate::document::DriverError;

/// Result type alias for Plugstore operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for Plugstore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key has no record in the namespace
    #[error("{0} doesn't exist")]
    MissingKey(String),

    /// The upsert acknowledged neither an insert, a replace, nor an unchanged row
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// A create call reported a creation count other than exactly one
    #[error("Schema provisioning failed: {0}")]
    Provisioning(String),

    /// Value could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// Record type tag is not present in the type registry
    #[error("Unknown record type: {0}")]
    UnknownType(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connectivity or driver failure, propagated as-is
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl StoreError {
    /// Whether this error signals an absent key.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, StoreError::MissingKey(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}
