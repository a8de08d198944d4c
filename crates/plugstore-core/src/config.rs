//! Connection parameters.
//!
//! The host framework hands the storage plugin a plain mapping of connection
//! parameters; it is parsed into a `ConnectionConfig` once per `open`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::schema::DB_NAME;

/// Raw connection parameters as supplied by the host framework.
pub type StorageConfig = serde_json::Map<String, serde_json::Value>;

/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Database file; `None` opens a private in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Name of the database that holds every namespace table.
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_database() -> String {
    DB_NAME.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            path: None,
            database: default_database(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration for a database file at `path`.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parse a host-supplied parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for unknown keys or mistyped values.
    pub fn from_map(map: &StorageConfig) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(map.clone()))
            .map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
