use clap::{Parser, Subcommand};
use clap_complete::Shell;

use plugstore_core::VERSION;

/// Plugstore - inspect and edit plugin key-value storage
#[derive(Parser)]
#[command(name = "plugstore")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the storage database file
    #[arg(short, long, global = true, env = "PLUGSTORE_PATH")]
    pub path: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true, env = "PLUGSTORE_CONFIG")]
    pub config: Option<String>,

    /// Name of the database holding the namespaces
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List namespaces
    Namespaces,

    /// List the keys of a namespace
    Keys {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,
    },

    /// Count the records of a namespace
    Count {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,
    },

    /// Print the stored payload of a key
    Get {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,

        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Store a value under a key
    Set {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,

        #[arg(value_name = "KEY")]
        key: String,

        /// Value as JSON (use --string to store text verbatim)
        #[arg(value_name = "VALUE")]
        value: String,

        /// Store VALUE as a plain string instead of parsing it as JSON
        #[arg(long)]
        string: bool,
    },

    /// Remove a key
    Remove {
        #[arg(value_name = "NAMESPACE")]
        namespace: String,

        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}
