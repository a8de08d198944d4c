//! Document database access.
//!
//! - **traits**: the `DocumentConnection` contract
//! - **types**: acknowledgement and request types
//! - **sqlite**: a document database emulated on top of SQLite

mod error;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::{DriverError, DriverResult};
pub use sqlite::SqliteConnection;
pub use traits::DocumentConnection;
pub use types::{Conflict, DbCreated, Document, TableCreated, TableRef, WriteResult, PRIMARY_KEY};
