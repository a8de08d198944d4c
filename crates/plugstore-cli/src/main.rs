//! Plugstore CLI - inspect and edit plugin key-value storage
//!
//! Operator tool over the plugstore core library: list namespaces, read and
//! write keys, and check record counts in a storage database file.

mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use errors::exit_code_for;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(err) = commands::run(&cli) {
        eprintln!("Error: {}", err);
        std::process::exit(exit_code_for(&err));
    }
}
