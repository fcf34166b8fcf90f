//! Communities command - list and validate the community list

use anyhow::{Context, Result, bail};
use img_harvest_adapters::{communities::load_community_list, ledger::FsLedgerStore};
use std::path::PathBuf;

use crate::args::{CommunitiesArgs, CommunitiesCommands};
use crate::config::AppConfig;

pub async fn execute(args: CommunitiesArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        CommunitiesCommands::List { file, json } => list_communities(file, json, config_path).await,
        CommunitiesCommands::Validate { file } => validate_communities(file, config_path).await,
    }
}

async fn list_communities(
    file: Option<PathBuf>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let path = file.as_ref().unwrap_or(&config.general.communities_file);

    let list = load_community_list(path)
        .await
        .context("Failed to load community list")?;

    if json {
        let store = FsLedgerStore::new(&config.general.data_dir, &config.general.summary_file);
        let output = serde_json::json!({
            "count": list.communities.len(),
            "communities": list.communities.iter().map(|c| serde_json::json!({
                "name": c.as_str(),
                "ledger": store.ledger_path(c).display().to_string(),
            })).collect::<Vec<_>>(),
            "skipped": list.skipped.iter().map(|s| serde_json::json!({
                "line": s.line,
                "error": s.error.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Communities ({} found)", list.communities.len());
        println!("====================");
        println!();

        for community in &list.communities {
            println!("  {}", community);
        }

        if !list.skipped.is_empty() {
            println!();
            println!("Skipped {} invalid line(s)", list.skipped.len());
        }
    }

    Ok(())
}

async fn validate_communities(file: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();
    let path = file.as_ref().unwrap_or(&config.general.communities_file);

    println!("Validating community list: {}", path.display());

    let list = load_community_list(path)
        .await
        .context("Failed to load community list")?;

    if list.skipped.is_empty() && !list.communities.is_empty() {
        println!("✓ Validation passed ({} communities)", list.communities.len());
        return Ok(());
    }

    for skipped in &list.skipped {
        eprintln!("  line {}: {}", skipped.line, skipped.error);
    }

    if list.communities.is_empty() {
        bail!("Validation failed: no valid communities");
    }

    bail!("Validation failed: {} invalid line(s)", list.skipped.len());
}
