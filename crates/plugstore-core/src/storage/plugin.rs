//! Storage plugin backed by the document database driver.

use std::sync::Arc;

use tracing::debug;

use crate::codec::TypeRegistry;
use crate::config::{ConnectionConfig, StorageConfig};
use crate::document::{DocumentConnection, SqliteConnection};
use crate::error::Result;

use super::adapter::NamespaceStorage;
use super::traits::{Storage, StoragePlugin};

/// Opens one provisioned namespace per plugin.
///
/// The configuration mapping is parsed and a fresh connection is made on
/// every `open`; the returned storage keeps that connection alive.
pub struct DocumentStoragePlugin {
    config: StorageConfig,
    registry: Arc<TypeRegistry>,
}

impl DocumentStoragePlugin {
    pub fn new(config: StorageConfig, registry: Arc<TypeRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Like [`StoragePlugin::open`], returning the concrete storage type.
    pub fn open_storage(&self, namespace: &str) -> Result<NamespaceStorage> {
        let config = ConnectionConfig::from_map(&self.config)?;

        debug!(action = "open", namespace, database = %config.database);

        let conn: Arc<dyn DocumentConnection> = Arc::new(SqliteConnection::connect(&config)?);
        NamespaceStorage::provision(conn, &config.database, namespace, self.registry.clone())
    }
}

impl StoragePlugin for DocumentStoragePlugin {
    fn open(&self, namespace: &str) -> Result<Box<dyn Storage>> {
        Ok(Box::new(self.open_storage(namespace)?))
    }
}
