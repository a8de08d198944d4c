//! Storage interface consumed by the host framework.
//!
//! `StoragePlugin` is the factory a host calls once per plugin; the returned
//! `Storage` handle is the plugin's private key-value namespace.

use crate::codec::Value;
use crate::error::Result;

/// Key-value handle bound to one namespace.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingKey` if no record exists for `key`.
    fn get(&self, key: &str) -> Result<Value>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteRejected` if the database acknowledged no
    /// write, or a codec error if the value cannot be encoded. Nothing is
    /// written when encoding fails.
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingKey` if nothing was deleted.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys in the namespace, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Number of records in the namespace.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Release the handle. The connection itself is owned by the caller.
    fn close(&self) -> Result<()>;
}

/// Factory that opens per-namespace storage.
pub trait StoragePlugin {
    fn open(&self, namespace: &str) -> Result<Box<dyn Storage>>;
}
