//! Config file loading and storage parameter resolution.
//!
//! The config file is TOML with a single `[storage]` table whose keys are the
//! connection parameters handed to the storage plugin:
//!
//! ```toml
//! [storage]
//! path = "/var/lib/bot/plugstore.db"
//! database = "plugstore"
//! busy_timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use plugstore_core::config::StorageConfig;

use crate::cli::Cli;
use crate::errors::CliError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlugstoreConfig {
    #[serde(default)]
    pub storage: toml::Table,
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<PlugstoreConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

/// Config file to load: `--config` if given (it must exist), otherwise the
/// default location when present.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = cli.config.as_deref() {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(CliError::not_found(
                format!("No config found at {}", path.display()),
                "Check the --config path or PLUGSTORE_CONFIG.",
            )
            .into());
        }
        return Ok(Some(path));
    }

    let default = default_config_path()?;
    Ok(default.exists().then_some(default))
}

/// Build the storage parameter mapping from the config file and CLI flags.
///
/// Flags override file values. A storage path is required; an in-memory
/// database would be empty on every run.
pub fn storage_config(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let mut mapping = match resolve_config_path(cli)? {
        Some(path) => {
            tracing::debug!(action = "load_config", path = %path.display());
            table_to_mapping(read_config(&path)?.storage)?
        }
        None => StorageConfig::new(),
    };

    if let Some(path) = cli.path.as_deref() {
        mapping.insert("path".to_string(), serde_json::Value::from(path));
    }
    if let Some(database) = cli.database.as_deref() {
        mapping.insert("database".to_string(), serde_json::Value::from(database));
    }

    if !mapping.contains_key("path") {
        return Err(CliError::not_found(
            "No storage path configured",
            "Pass --path, set PLUGSTORE_PATH, or add `path` under [storage] in the config file.",
        )
        .into());
    }

    Ok(mapping)
}

fn table_to_mapping(table: toml::Table) -> anyhow::Result<StorageConfig> {
    match serde_json::to_value(table)? {
        serde_json::Value::Object(mapping) => Ok(mapping),
        other => Err(anyhow::anyhow!("[storage] must be a table, got {}", other)),
    }
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("plugstore"));
        }
    }
    Ok(home_dir()?.join(".config").join("plugstore"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
