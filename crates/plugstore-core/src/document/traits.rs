//! Document database connection trait.
//!
//! `DocumentConnection` is the narrow contract the storage adapter and the
//! schema provisioner need from a document database client. Every call is a
//! single synchronous round-trip and returns a structured acknowledgement.

use super::error::DriverResult;
use super::types::{Conflict, DbCreated, Document, TableCreated, TableRef, WriteResult};

/// Connection handle to a document database.
///
/// Implementations own whatever synchronization their client needs; callers
/// share a connection through `Arc<dyn DocumentConnection>`.
pub trait DocumentConnection: Send + Sync {
    /// List the names of all databases.
    fn db_list(&self) -> DriverResult<Vec<String>>;

    /// Create a database.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::OpFailed` if:
    /// - The name is invalid
    /// - A database with that name already exists
    fn db_create(&self, name: &str) -> DriverResult<DbCreated>;

    /// List the table names inside a database.
    fn table_list(&self, db: &str) -> DriverResult<Vec<String>>;

    /// Create a table inside an existing database.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::OpFailed` if:
    /// - The name is invalid
    /// - The database does not exist
    /// - The table already exists
    fn table_create(&self, table: TableRef<'_>) -> DriverResult<TableCreated>;

    /// Read one attribute of the document with primary key `id`.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NonExistence` if the document does not exist or
    /// has no such attribute.
    fn get_field(&self, table: TableRef<'_>, id: &str, field: &str) -> DriverResult<serde_json::Value>;

    /// Insert a document, resolving primary key collisions with `conflict`.
    ///
    /// Rejections caused by the conflict policy are reported in
    /// `WriteResult::errors`, not as an `Err`.
    fn insert(&self, table: TableRef<'_>, document: Document, conflict: Conflict) -> DriverResult<WriteResult>;

    /// Delete the document with primary key `id`.
    ///
    /// A missing document is reported as `skipped`, not as an error.
    fn delete(&self, table: TableRef<'_>, id: &str) -> DriverResult<WriteResult>;

    /// Project one attribute out of every document that has it.
    fn pluck_field(&self, table: TableRef<'_>, field: &str) -> DriverResult<Vec<serde_json::Value>>;

    /// Count the documents in a table.
    fn count(&self, table: TableRef<'_>) -> DriverResult<u64>;
}
