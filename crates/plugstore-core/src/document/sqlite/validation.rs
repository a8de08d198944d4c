//! Name and primary key validation for the SQLite document driver.

use crate::document::error::{DriverError, DriverResult};
use crate::document::types::{Document, PRIMARY_KEY};

/// Longest accepted database or table name.
pub const MAX_NAME_LEN: usize = 64;

/// Longest accepted primary key, in bytes.
pub const MAX_PRIMARY_KEY_BYTES: usize = 127;

/// Database and table names are restricted to `[A-Za-z0-9_-]+`.
///
/// The restriction also guarantees a name can be embedded in a quoted SQLite
/// identifier and that `.` can separate database from table.
pub fn validate_name(kind: &str, name: &str) -> DriverResult<()> {
    if name.is_empty() {
        return Err(DriverError::OpFailed(format!("{} name cannot be empty", kind)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DriverError::OpFailed(format!(
            "{} name `{}` is too long (max {} characters)",
            kind, name, MAX_NAME_LEN
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DriverError::OpFailed(format!(
            "{} name `{}` invalid (Use A-Z, a-z, 0-9, _ and - only)",
            kind, name
        )));
    }
    Ok(())
}

pub fn validate_primary_key(id: &str) -> DriverResult<()> {
    if id.is_empty() {
        return Err(DriverError::OpFailed("Primary key cannot be empty".to_string()));
    }
    if id.len() > MAX_PRIMARY_KEY_BYTES {
        return Err(DriverError::OpFailed(format!(
            "Primary key too long (max {} bytes)",
            MAX_PRIMARY_KEY_BYTES
        )));
    }
    Ok(())
}

/// Extract and validate the string primary key of a document.
pub fn primary_key(document: &Document) -> DriverResult<&str> {
    let id = match document.get(PRIMARY_KEY) {
        Some(serde_json::Value::String(id)) => id.as_str(),
        Some(other) => {
            return Err(DriverError::OpFailed(format!(
                "Primary key must be a string, got `{}`",
                other
            )))
        }
        None => {
            return Err(DriverError::OpFailed(format!(
                "Document is missing primary key `{}`",
                PRIMARY_KEY
            )))
        }
    };
    validate_primary_key(id)?;
    Ok(id)
}
