//! Lazy database and table provisioning.

use std::sync::Arc;

use tracing::debug;

use crate::document::{DocumentConnection, TableRef};
use crate::error::{Result, StoreError};

/// Default name of the database holding every namespace table.
pub const DB_NAME: &str = "plugstore";

/// Ensures the database and a namespace table exist before storage is used.
pub struct SchemaProvisioner {
    conn: Arc<dyn DocumentConnection>,
    db: String,
}

impl SchemaProvisioner {
    pub fn new(conn: Arc<dyn DocumentConnection>, db: impl Into<String>) -> Self {
        Self {
            conn,
            db: db.into(),
        }
    }

    /// Provisioner for the default database.
    pub fn from_connection(conn: Arc<dyn DocumentConnection>) -> Self {
        Self::new(conn, DB_NAME)
    }

    pub fn connection(&self) -> &Arc<dyn DocumentConnection> {
        &self.conn
    }

    pub fn database(&self) -> &str {
        &self.db
    }

    /// Create the database and then the namespace table, each only if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Provisioning` when a create call reports anything
    /// other than exactly one creation. Driver errors are passed through.
    pub fn setup(&self, namespace: &str) -> Result<()> {
        if self.database_missing()? {
            self.create_database()?;
        }

        if self.table_missing(namespace)? {
            self.create_table(namespace)?;
        }

        Ok(())
    }

    /// Namespace tables currently present in the database.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        if self.database_missing()? {
            return Ok(Vec::new());
        }
        Ok(self.conn.table_list(&self.db)?)
    }

    fn create_database(&self) -> Result<()> {
        debug!(action = "create_database", name = %self.db);

        let result = self.conn.db_create(&self.db)?;
        if result.dbs_created != 1 {
            return Err(StoreError::Provisioning(format!(
                "Create database {} failed: {} created",
                self.db, result.dbs_created
            )));
        }
        Ok(())
    }

    fn create_table(&self, namespace: &str) -> Result<()> {
        debug!(action = "create_table", name = %namespace);

        let result = self.conn.table_create(TableRef::new(&self.db, namespace))?;
        if result.tables_created != 1 {
            return Err(StoreError::Provisioning(format!(
                "Create table {} failed: {} created",
                namespace, result.tables_created
            )));
        }
        Ok(())
    }

    fn database_missing(&self) -> Result<bool> {
        Ok(!self.conn.db_list()?.iter().any(|name| name == &self.db))
    }

    fn table_missing(&self, namespace: &str) -> Result<bool> {
        Ok(!self
            .conn
            .table_list(&self.db)?
            .iter()
            .any(|name| name == namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Conflict, DbCreated, Document, DriverError, DriverResult, SqliteConnection, TableCreated,
        WriteResult,
    };

    /// Driver stub whose create acknowledgements report a fixed count.
    struct MiscountingConnection {
        dbs_created: u64,
        tables_created: u64,
        has_db: bool,
    }

    impl DocumentConnection for MiscountingConnection {
        fn db_list(&self) -> DriverResult<Vec<String>> {
            Ok(if self.has_db {
                vec![DB_NAME.to_string()]
            } else {
                Vec::new()
            })
        }

        fn db_create(&self, _name: &str) -> DriverResult<DbCreated> {
            Ok(DbCreated {
                dbs_created: self.dbs_created,
            })
        }

        fn table_list(&self, _db: &str) -> DriverResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn table_create(&self, _table: TableRef<'_>) -> DriverResult<TableCreated> {
            Ok(TableCreated {
                tables_created: self.tables_created,
            })
        }

        fn get_field(&self, _table: TableRef<'_>, _id: &str, _field: &str) -> DriverResult<serde_json::Value> {
            Err(DriverError::OpFailed("unsupported".to_string()))
        }

        fn insert(&self, _table: TableRef<'_>, _document: Document, _conflict: Conflict) -> DriverResult<WriteResult> {
            Err(DriverError::OpFailed("unsupported".to_string()))
        }

        fn delete(&self, _table: TableRef<'_>, _id: &str) -> DriverResult<WriteResult> {
            Err(DriverError::OpFailed("unsupported".to_string()))
        }

        fn pluck_field(&self, _table: TableRef<'_>, _field: &str) -> DriverResult<Vec<serde_json::Value>> {
            Err(DriverError::OpFailed("unsupported".to_string()))
        }

        fn count(&self, _table: TableRef<'_>) -> DriverResult<u64> {
            Err(DriverError::OpFailed("unsupported".to_string()))
        }
    }

    fn sqlite() -> Arc<dyn DocumentConnection> {
        Arc::new(SqliteConnection::open_in_memory().unwrap())
    }

    #[test]
    fn test_setup_creates_database_and_table() {
        let conn = sqlite();
        let provisioner = SchemaProvisioner::from_connection(conn.clone());

        provisioner.setup("ns").unwrap();

        assert_eq!(conn.db_list().unwrap(), vec![DB_NAME.to_string()]);
        assert_eq!(conn.table_list(DB_NAME).unwrap(), vec!["ns".to_string()]);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = sqlite();
        let provisioner = SchemaProvisioner::from_connection(conn.clone());

        provisioner.setup("ns").unwrap();
        provisioner.setup("ns").unwrap();

        assert_eq!(conn.db_list().unwrap().len(), 1);
        assert_eq!(conn.table_list(DB_NAME).unwrap(), vec!["ns".to_string()]);
    }

    #[test]
    fn test_setup_adds_tables_to_existing_database() {
        let conn = sqlite();
        let provisioner = SchemaProvisioner::new(conn.clone(), "errbot_storage");

        provisioner.setup("weather").unwrap();
        provisioner.setup("karma").unwrap();

        assert_eq!(provisioner.database(), "errbot_storage");
        assert_eq!(
            provisioner.namespaces().unwrap(),
            vec!["karma".to_string(), "weather".to_string()]
        );
    }

    #[test]
    fn test_namespaces_empty_before_setup() {
        let provisioner = SchemaProvisioner::from_connection(sqlite());
        assert!(provisioner.namespaces().unwrap().is_empty());
    }

    #[test]
    fn test_zero_databases_created_is_provisioning_error() {
        let conn = Arc::new(MiscountingConnection {
            dbs_created: 0,
            tables_created: 1,
            has_db: false,
        });
        let err = SchemaProvisioner::from_connection(conn).setup("ns").unwrap_err();
        assert!(matches!(err, StoreError::Provisioning(_)));
    }

    #[test]
    fn test_two_tables_created_is_provisioning_error() {
        let conn = Arc::new(MiscountingConnection {
            dbs_created: 1,
            tables_created: 2,
            has_db: true,
        });
        let err = SchemaProvisioner::from_connection(conn).setup("ns").unwrap_err();
        assert!(matches!(err, StoreError::Provisioning(msg) if msg.contains("Create table ns")));
    }

    #[test]
    fn test_invalid_namespace_is_driver_error() {
        let err = SchemaProvisioner::from_connection(sqlite())
            .setup("bad.name")
            .unwrap_err();
        assert!(matches!(err, StoreError::Driver(DriverError::OpFailed(_))));
    }
}
