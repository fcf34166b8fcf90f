//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// img-harvest: collect live image links from community top posts
#[derive(Parser, Debug)]
#[command(name = "img-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Admit new live images from each community's top posts
    Collect(CollectArgs),

    /// Re-check ledgered images and prune the dead ones
    Scan(ScanArgs),

    /// Inspect the community list
    Communities(CommunitiesArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Classify and report without writing ledgers or the summary
    #[arg(long)]
    pub dry_run: bool,

    /// Repeat every poll interval until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Override the run summary path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Report what would be pruned without rewriting ledgers
    #[arg(long)]
    pub dry_run: bool,

    /// Print the scan reports as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CommunitiesArgs {
    #[command(subcommand)]
    pub command: CommunitiesCommands,
}

#[derive(Subcommand, Debug)]
pub enum CommunitiesCommands {
    /// List the communities that would be processed
    List {
        /// Override the community list file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fail if any line of the community list is invalid
    Validate {
        /// Override the community list file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
