//! Document database emulated on SQLite.
//!
//! Databases and tables live in two catalog tables. Every document table is a
//! physical SQLite table named `"<db>.<table>"` holding the primary key and the
//! full JSON document.
//!
//! Write transactions start IMMEDIATE so that concurrent writers on the same
//! file wait on the busy timeout instead of failing on lock upgrade.

mod validation;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::config::ConnectionConfig;
use crate::document::error::{DriverError, DriverResult};
use crate::document::traits::DocumentConnection;
use crate::document::types::{
    Conflict, DbCreated, Document, TableCreated, TableRef, WriteResult,
};

use validation::{primary_key, validate_name};

pub use validation::{MAX_NAME_LEN, MAX_PRIMARY_KEY_BYTES};

const CATALOG_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS _plugstore_databases (
        name TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS _plugstore_tables (
        db TEXT NOT NULL,
        name TEXT NOT NULL,

        PRIMARY KEY (db, name),
        FOREIGN KEY (db) REFERENCES _plugstore_databases(name)
    );
"#;

/// SQLite-backed document database connection.
pub struct SqliteConnection {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteConnection {
    /// Connect using host-supplied parameters.
    pub fn connect(config: &ConnectionConfig) -> DriverResult<Self> {
        let conn = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(|e| {
                            DriverError::Connection(format!(
                                "Failed to create directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout())?;
        Self::init(conn, config.path.clone())
    }

    /// Open or create a database file with default settings.
    pub fn open(path: &Path) -> DriverResult<Self> {
        Self::connect(&ConnectionConfig::at_path(path))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> DriverResult<Self> {
        Self::connect(&ConnectionConfig::in_memory())
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> DriverResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(CATALOG_SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Database file, or `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> DriverResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DriverError::Connection("SQLite connection poisoned".to_string()))
    }
}

fn physical_name(table: TableRef<'_>) -> String {
    format!("\"{}.{}\"", table.db, table.table)
}

fn db_exists(conn: &Connection, name: &str) -> DriverResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM _plugstore_databases WHERE name = ?",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_exists(conn: &Connection, table: TableRef<'_>) -> DriverResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM _plugstore_tables WHERE db = ? AND name = ?",
            (table.db, table.table),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn require_db(conn: &Connection, name: &str) -> DriverResult<()> {
    if !db_exists(conn, name)? {
        return Err(DriverError::OpFailed(format!(
            "Database `{}` does not exist",
            name
        )));
    }
    Ok(())
}

fn require_table(conn: &Connection, table: TableRef<'_>) -> DriverResult<()> {
    require_db(conn, table.db)?;
    if !table_exists(conn, table)? {
        return Err(DriverError::OpFailed(format!(
            "Table `{}` does not exist",
            table
        )));
    }
    Ok(())
}

fn load_document(conn: &Connection, table: TableRef<'_>, id: &str) -> DriverResult<Option<Document>> {
    let raw: Option<String> = conn
        .query_row(
            &format!("SELECT doc FROM {} WHERE id = ?", physical_name(table)),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

impl DocumentConnection for SqliteConnection {
    fn db_list(&self) -> DriverResult<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM _plugstore_databases ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn db_create(&self, name: &str) -> DriverResult<DbCreated> {
        validate_name("Database", name)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if db_exists(&tx, name)? {
            return Err(DriverError::OpFailed(format!(
                "Database `{}` already exists",
                name
            )));
        }

        tx.execute("INSERT INTO _plugstore_databases (name) VALUES (?)", [name])?;
        tx.commit()?;

        Ok(DbCreated { dbs_created: 1 })
    }

    fn table_list(&self, db: &str) -> DriverResult<Vec<String>> {
        let conn = self.lock_conn()?;
        require_db(&conn, db)?;

        let mut stmt = conn.prepare("SELECT name FROM _plugstore_tables WHERE db = ? ORDER BY name")?;
        let names = stmt
            .query_map([db], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn table_create(&self, table: TableRef<'_>) -> DriverResult<TableCreated> {
        validate_name("Table", table.table)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_db(&tx, table.db)?;
        if table_exists(&tx, table)? {
            return Err(DriverError::OpFailed(format!(
                "Table `{}` already exists",
                table
            )));
        }

        tx.execute(
            "INSERT INTO _plugstore_tables (db, name) VALUES (?, ?)",
            (table.db, table.table),
        )?;
        tx.execute_batch(&format!(
            "CREATE TABLE {} (id TEXT PRIMARY KEY, doc TEXT NOT NULL);",
            physical_name(table)
        ))?;
        tx.commit()?;

        Ok(TableCreated { tables_created: 1 })
    }

    fn get_field(&self, table: TableRef<'_>, id: &str, field: &str) -> DriverResult<serde_json::Value> {
        let conn = self.lock_conn()?;
        require_table(&conn, table)?;

        let document = load_document(&conn, table, id)?.ok_or_else(|| {
            DriverError::NonExistence(
                "Cannot perform get_field on a non-object non-sequence `null`".to_string(),
            )
        })?;

        document.get(field).cloned().ok_or_else(|| {
            DriverError::NonExistence(format!("No attribute `{}` in object with id `{}`", field, id))
        })
    }

    fn insert(&self, table: TableRef<'_>, document: Document, conflict: Conflict) -> DriverResult<WriteResult> {
        let id = primary_key(&document)?.to_string();

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_table(&tx, table)?;

        let existing = load_document(&tx, table, &id)?;
        let mut result = WriteResult::default();

        match existing {
            None => {
                tx.execute(
                    &format!("INSERT INTO {} (id, doc) VALUES (?, ?)", physical_name(table)),
                    (&id, serde_json::to_string(&document)?),
                )?;
                result.inserted = 1;
            }
            Some(current) => {
                let next = match conflict {
                    Conflict::Error => {
                        result.errors = 1;
                        result.first_error = Some(format!(
                            "Duplicate primary key `id`: `{}` already exists in `{}`",
                            id, table
                        ));
                        return Ok(result);
                    }
                    Conflict::Replace => document,
                    Conflict::Update => {
                        let mut merged = current.clone();
                        merged.extend(document);
                        merged
                    }
                };

                if next == current {
                    result.unchanged = 1;
                } else {
                    tx.execute(
                        &format!("UPDATE {} SET doc = ? WHERE id = ?", physical_name(table)),
                        (serde_json::to_string(&next)?, &id),
                    )?;
                    result.replaced = 1;
                }
            }
        }

        tx.commit()?;
        Ok(result)
    }

    /// Keys that could never have been written are skipped, like any other
    /// absent key.
    fn delete(&self, table: TableRef<'_>, id: &str) -> DriverResult<WriteResult> {
        let conn = self.lock_conn()?;
        require_table(&conn, table)?;

        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", physical_name(table)),
            [id],
        )? as u64;

        Ok(WriteResult {
            deleted,
            skipped: u64::from(deleted == 0),
            ..WriteResult::default()
        })
    }

    fn pluck_field(&self, table: TableRef<'_>, field: &str) -> DriverResult<Vec<serde_json::Value>> {
        let conn = self.lock_conn()?;
        require_table(&conn, table)?;

        let mut stmt = conn.prepare(&format!("SELECT doc FROM {}", physical_name(table)))?;
        let raws = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut values = Vec::with_capacity(raws.len());
        for raw in raws {
            let mut document: Document = serde_json::from_str(&raw)?;
            if let Some(value) = document.remove(field) {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn count(&self, table: TableRef<'_>) -> DriverResult<u64> {
        let conn = self.lock_conn()?;
        require_table(&conn, table)?;

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", physical_name(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
