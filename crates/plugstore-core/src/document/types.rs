//! Request and acknowledgement types exchanged with a document database.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single document: a JSON object whose `id` attribute is the primary key.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the primary key attribute of every document.
pub const PRIMARY_KEY: &str = "id";

/// Fully qualified reference to a table inside a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub db: &'a str,
    pub table: &'a str,
}

impl<'a> TableRef<'a> {
    pub fn new(db: &'a str, table: &'a str) -> Self {
        Self { db, table }
    }
}

impl fmt::Display for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.table)
    }
}

/// What `insert` does when a document with the same primary key exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conflict {
    /// Reject the write and report it in `errors`
    #[default]
    Error,
    /// Swap the stored document for the new one
    Replace,
    /// Merge the new document's top-level attributes into the stored one
    Update,
}

/// Acknowledgement of a database creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DbCreated {
    pub dbs_created: u64,
}

/// Acknowledgement of a table creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableCreated {
    pub tables_created: u64,
}

/// Acknowledgement of a write (insert or delete).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteResult {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_error: Option<String>,
}
