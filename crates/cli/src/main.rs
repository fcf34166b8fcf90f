//! img-harvest CLI entry point

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = resolve_log_level(cli.log_level.as_deref(), cli.config.as_deref());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Collect(args) => commands::collect::execute(args, cli.config).await,
        Commands::Scan(args) => commands::scan::execute(args, cli.config).await,
        Commands::Communities(args) => commands::communities::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
    }
}

/// `--log-level` wins over `general.log_level`; a config that fails to load
/// is reported by the command itself
fn resolve_log_level(flag: Option<&str>, config_path: Option<&Path>) -> String {
    match flag {
        Some(level) => level.to_string(),
        None => AppConfig::load(config_path)
            .map(|config| config.general.log_level)
            .unwrap_or_else(|_| "info".to_string()),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
