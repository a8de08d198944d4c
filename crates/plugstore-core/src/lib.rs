//! # Plugstore Core
//!
//! Key-value storage for chat-bot plugins, persisted into a document database
//! with one table per plugin namespace.
//!
//! ## Architecture
//!
//! - **codec**: self-describing value encoding and the record type registry
//! - **document**: document database driver contract and the SQLite-backed driver
//! - **schema**: lazy database/table provisioning
//! - **storage**: the per-namespace storage adapter and the plugin factory
//! - **config**: connection parameters read at plugin-open time

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod schema;
pub mod storage;

pub use codec::{Persist, TypeRegistry, Value};
pub use config::ConnectionConfig;
pub use document::{DocumentConnection, DriverError, SqliteConnection};
pub use error::{Result, StoreError};
pub use schema::{SchemaProvisioner, DB_NAME};
pub use storage::{DocumentStoragePlugin, NamespaceStorage, Storage, StoragePlugin};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
