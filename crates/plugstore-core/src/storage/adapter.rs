//! Storage adapter over a document database table.

use std::sync::Arc;

use tracing::debug;

use crate::codec::{TypeRegistry, Value};
use crate::document::{Conflict, DocumentConnection, TableRef, WriteResult, PRIMARY_KEY};
use crate::error::{Result, StoreError};
use crate::schema::SchemaProvisioner;

use super::traits::Storage;

/// Attribute holding the encoded payload of a record.
pub const VALUE_FIELD: &str = "value";

/// Key-value storage for a single namespace table.
pub struct NamespaceStorage {
    conn: Arc<dyn DocumentConnection>,
    db: String,
    namespace: String,
    registry: Arc<TypeRegistry>,
}

impl NamespaceStorage {
    /// Bind to a table that is already provisioned.
    pub fn new(
        conn: Arc<dyn DocumentConnection>,
        db: impl Into<String>,
        namespace: impl Into<String>,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            conn,
            db: db.into(),
            namespace: namespace.into(),
            registry,
        }
    }

    /// Provision the database and table, then bind to the table.
    pub fn provision(
        conn: Arc<dyn DocumentConnection>,
        db: &str,
        namespace: &str,
        registry: Arc<TypeRegistry>,
    ) -> Result<Self> {
        SchemaProvisioner::new(conn.clone(), db).setup(namespace)?;
        Ok(Self::new(conn, db, namespace, registry))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn database(&self) -> &str {
        &self.db
    }

    pub fn connection(&self) -> &Arc<dyn DocumentConnection> {
        &self.conn
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Stored payload for `key`, without decoding it.
    pub fn get_raw(&self, key: &str) -> Result<String> {
        validate_key(key)?;

        match self.conn.get_field(self.table(), key, VALUE_FIELD) {
            Ok(serde_json::Value::String(payload)) => Ok(payload),
            Ok(other) => Err(StoreError::Codec(format!(
                "Stored value for {} is not a string: {}",
                key, other
            ))),
            Err(e) if e.is_non_existence() => Err(StoreError::MissingKey(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn table(&self) -> TableRef<'_> {
        TableRef::new(&self.db, &self.namespace)
    }

    fn was_successful(result: &WriteResult) -> bool {
        result.inserted > 0 || result.replaced > 0 || result.unchanged > 0
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidInput("Key cannot be empty".to_string()));
    }
    Ok(())
}

impl Storage for NamespaceStorage {
    fn get(&self, key: &str) -> Result<Value> {
        debug!(action = "get_key", namespace = %self.namespace, key);

        let payload = self.get_raw(key)?;
        self.registry.decode(&payload)
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        let encoded = self.registry.encode(value)?;

        debug!(action = "set_key", namespace = %self.namespace, key, value = %encoded);

        let mut document = serde_json::Map::with_capacity(2);
        document.insert(PRIMARY_KEY.to_string(), serde_json::Value::from(key));
        document.insert(VALUE_FIELD.to_string(), serde_json::Value::String(encoded));

        let result = self.conn.insert(self.table(), document, Conflict::Update)?;
        if !Self::was_successful(&result) {
            return Err(StoreError::WriteRejected(match result.first_error {
                Some(reason) => format!("key {} not inserted: {}", key, reason),
                None => format!("key {} not inserted", key),
            }));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        debug!(action = "remove_key", namespace = %self.namespace, key);

        let result = self.conn.delete(self.table(), key)?;
        if result.deleted != 1 {
            return Err(StoreError::MissingKey(key.to_string()));
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.conn
            .pluck_field(self.table(), PRIMARY_KEY)?
            .into_iter()
            .map(|id| match id {
                serde_json::Value::String(id) => Ok(id),
                other => Err(StoreError::Codec(format!("Non-string key {}", other))),
            })
            .collect()
    }

    fn len(&self) -> Result<usize> {
        let count = self.conn.count(self.table())?;
        usize::try_from(count)
            .map_err(|_| StoreError::Codec(format!("Record count {} exceeds usize", count)))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::document::{
        DbCreated, Document, DriverError, DriverResult, SqliteConnection, TableCreated,
    };
    use crate::schema::DB_NAME;

    /// Driver stub that acknowledges writes with a canned result and fails
    /// reads with a canned error.
    struct CannedConnection {
        write: WriteResult,
        read_error: Mutex<Option<DriverError>>,
    }

    impl CannedConnection {
        fn new(write: WriteResult, read_error: DriverError) -> Self {
            Self {
                write,
                read_error: Mutex::new(Some(read_error)),
            }
        }
    }

    impl DocumentConnection for CannedConnection {
        fn db_list(&self) -> DriverResult<Vec<String>> {
            Ok(vec![DB_NAME.to_string()])
        }

        fn db_create(&self, _name: &str) -> DriverResult<DbCreated> {
            Ok(DbCreated { dbs_created: 1 })
        }

        fn table_list(&self, _db: &str) -> DriverResult<Vec<String>> {
            Ok(vec!["ns".to_string()])
        }

        fn table_create(&self, _table: TableRef<'_>) -> DriverResult<TableCreated> {
            Ok(TableCreated { tables_created: 1 })
        }

        fn get_field(&self, _table: TableRef<'_>, _id: &str, _field: &str) -> DriverResult<serde_json::Value> {
            Err(self
                .read_error
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| DriverError::Connection("closed".to_string())))
        }

        fn insert(&self, _table: TableRef<'_>, _document: Document, _conflict: Conflict) -> DriverResult<WriteResult> {
            Ok(self.write.clone())
        }

        fn delete(&self, _table: TableRef<'_>, _id: &str) -> DriverResult<WriteResult> {
            Ok(self.write.clone())
        }

        fn pluck_field(&self, _table: TableRef<'_>, _field: &str) -> DriverResult<Vec<serde_json::Value>> {
            Ok(Vec::new())
        }

        fn count(&self, _table: TableRef<'_>) -> DriverResult<u64> {
            Ok(0)
        }
    }

    fn storage_over(conn: Arc<dyn DocumentConnection>) -> NamespaceStorage {
        NamespaceStorage::new(conn, DB_NAME, "ns", Arc::new(TypeRegistry::new()))
    }

    fn sqlite_storage() -> NamespaceStorage {
        let conn: Arc<dyn DocumentConnection> = Arc::new(SqliteConnection::open_in_memory().unwrap());
        NamespaceStorage::provision(conn, DB_NAME, "ns", Arc::new(TypeRegistry::new())).unwrap()
    }

    #[test]
    fn test_write_acknowledging_nothing_is_rejected() {
        let conn = Arc::new(CannedConnection::new(
            WriteResult {
                errors: 1,
                first_error: Some("disk full".to_string()),
                ..WriteResult::default()
            },
            DriverError::Connection("closed".to_string()),
        ));
        let err = storage_over(conn).set("foo", &Value::from("bar")).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_unchanged_write_counts_as_success() {
        let conn = Arc::new(CannedConnection::new(
            WriteResult {
                unchanged: 1,
                ..WriteResult::default()
            },
            DriverError::Connection("closed".to_string()),
        ));
        storage_over(conn).set("foo", &Value::from("bar")).unwrap();
    }

    #[test]
    fn test_connectivity_error_is_not_missing_key() {
        let conn = Arc::new(CannedConnection::new(
            WriteResult::default(),
            DriverError::Connection("connection reset".to_string()),
        ));
        let err = storage_over(conn).get("foo").unwrap_err();
        assert!(matches!(err, StoreError::Driver(DriverError::Connection(_))));
    }

    #[test]
    fn test_non_existence_is_missing_key() {
        let conn = Arc::new(CannedConnection::new(
            WriteResult::default(),
            DriverError::NonExistence("null".to_string()),
        ));
        let err = storage_over(conn).get("foo").unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(key) if key == "foo"));
    }

    #[test]
    fn test_empty_key_rejected_before_database() {
        let storage = sqlite_storage();
        assert!(matches!(storage.get(""), Err(StoreError::InvalidInput(_))));
        assert!(matches!(storage.set("", &Value::Null), Err(StoreError::InvalidInput(_))));
        assert!(matches!(storage.remove(""), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_failed_encoding_writes_nothing() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Unregistered;

        impl crate::codec::Persist for Unregistered {
            const TYPE_TAG: &'static str = "unregistered";
        }

        let storage = sqlite_storage();
        let err = storage.set("foo", &Value::record(Unregistered)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownType(_)));
        assert_eq!(storage.len().unwrap(), 0);
    }

    #[test]
    fn test_get_raw_returns_payload() {
        let storage = sqlite_storage();
        storage.set("foo", &Value::from("bar")).unwrap();
        assert_eq!(storage.get_raw("foo").unwrap(), "\"bar\"");
        assert!(storage.get_raw("nope").unwrap_err().is_missing_key());
    }

    #[test]
    fn test_non_string_payload_is_codec_error() {
        let storage = sqlite_storage();
        let mut document = Document::new();
        document.insert("id".to_string(), serde_json::json!("foo"));
        document.insert("value".to_string(), serde_json::json!(12));
        storage
            .connection()
            .insert(TableRef::new(DB_NAME, "ns"), document, Conflict::Error)
            .unwrap();

        assert!(matches!(storage.get("foo"), Err(StoreError::Codec(_))));
    }

    #[test]
    fn test_close_leaves_storage_usable() {
        let storage = sqlite_storage();
        storage.close().unwrap();
        storage.set("foo", &Value::Int(1)).unwrap();
        assert_eq!(storage.get("foo").unwrap(), Value::Int(1));
    }
}
