//! Command handlers.

use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;

use plugstore_core::{
    ConnectionConfig, DocumentConnection, DocumentStoragePlugin, NamespaceStorage,
    SchemaProvisioner, SqliteConnection, Storage, StoreError, TypeRegistry, Value,
};

use crate::cli::{Cli, Commands};
use crate::config::storage_config;
use crate::errors::CliError;
use crate::output;

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Namespaces => handle_namespaces(cli),
        Commands::Keys { namespace } => handle_keys(cli, namespace),
        Commands::Count { namespace } => handle_count(cli, namespace),
        Commands::Get { namespace, key } => handle_get(cli, namespace, key),
        Commands::Set {
            namespace,
            key,
            value,
            string,
        } => handle_set(cli, namespace, key, value, *string),
        Commands::Remove { namespace, key } => handle_remove(cli, namespace, key),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "plugstore", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Open a namespace for writing, provisioning it when absent. The CLI uses an
/// empty type registry and works on raw payloads and plain values only.
fn open_namespace(cli: &Cli, namespace: &str) -> anyhow::Result<NamespaceStorage> {
    let plugin = DocumentStoragePlugin::new(storage_config(cli)?, Arc::new(TypeRegistry::new()));
    Ok(plugin.open_storage(namespace)?)
}

fn connect(cli: &Cli) -> anyhow::Result<(Arc<dyn DocumentConnection>, ConnectionConfig)> {
    let config = ConnectionConfig::from_map(&storage_config(cli)?)?;
    let conn: Arc<dyn DocumentConnection> = Arc::new(SqliteConnection::connect(&config)?);
    Ok((conn, config))
}

/// Bind to a namespace without creating it. `None` when the table is absent.
fn existing_namespace(cli: &Cli, namespace: &str) -> anyhow::Result<Option<NamespaceStorage>> {
    let (conn, config) = connect(cli)?;
    let names = SchemaProvisioner::new(conn.clone(), config.database.as_str()).namespaces()?;
    if !names.iter().any(|name| name == namespace) {
        tracing::debug!(action = "open_namespace", namespace, "namespace does not exist");
        return Ok(None);
    }

    Ok(Some(NamespaceStorage::new(
        conn,
        config.database,
        namespace,
        Arc::new(TypeRegistry::new()),
    )))
}

fn handle_namespaces(cli: &Cli) -> anyhow::Result<()> {
    let (conn, config) = connect(cli)?;
    let names = SchemaProvisioner::new(conn, config.database).namespaces()?;
    output::print_list(&names, cli.json)
}

fn handle_keys(cli: &Cli, namespace: &str) -> anyhow::Result<()> {
    let mut keys = match existing_namespace(cli, namespace)? {
        Some(storage) => storage.keys()?,
        None => Vec::new(),
    };
    keys.sort();
    output::print_list(&keys, cli.json)
}

fn handle_count(cli: &Cli, namespace: &str) -> anyhow::Result<()> {
    let count = match existing_namespace(cli, namespace)? {
        Some(storage) => storage.len()?,
        None => 0,
    };
    output::print_count(namespace, count, cli.json)
}

fn handle_get(cli: &Cli, namespace: &str, key: &str) -> anyhow::Result<()> {
    let storage = existing_namespace(cli, namespace)?
        .ok_or_else(|| StoreError::MissingKey(key.to_string()))?;
    let payload = storage.get_raw(key)?;
    output::print_payload(namespace, key, &payload, cli.json)
}

fn handle_set(cli: &Cli, namespace: &str, key: &str, raw: &str, string: bool) -> anyhow::Result<()> {
    let value = if string {
        Value::from(raw)
    } else {
        let json: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            CliError::invalid_input(format!(
                "Invalid JSON value: {}\nUse --string to store text verbatim.",
                e
            ))
        })?;
        Value::from(json)
    };

    let storage = open_namespace(cli, namespace)?;
    storage.set(key, &value)?;

    if !cli.quiet {
        println!("Stored {} in {}", key, namespace);
    }
    Ok(())
}

fn handle_remove(cli: &Cli, namespace: &str, key: &str) -> anyhow::Result<()> {
    let storage = open_namespace(cli, namespace)?;
    storage.remove(key)?;

    if !cli.quiet {
        println!("Removed {} from {}", key, namespace);
    }
    Ok(())
}
