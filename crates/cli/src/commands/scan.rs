//! Scan command - prune dead images from every ledger

use anyhow::{Context, Result};
use img_harvest_adapters::{images::HttpImageFetcher, ledger::FsLedgerStore};
use img_harvest_domain::usecases::{MaintenanceScanner, MaintenanceSummary};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::ScanArgs;
use crate::commands::load_communities;
use crate::config::AppConfig;

pub async fn execute(args: ScanArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let maintenance_config = config.maintenance_config(args.dry_run)?;
    let communities = load_communities(&config).await?;

    tracing::info!(
        dry_run = args.dry_run,
        prune_unknown = maintenance_config.prune_unknown,
        communities = communities.len(),
        "Starting img-harvest scan"
    );

    let store = Arc::new(FsLedgerStore::new(
        &config.general.data_dir,
        &config.general.summary_file,
    ));
    let fetcher = Arc::new(
        HttpImageFetcher::new(maintenance_config.liveness.timeout, &config.reddit.user_agent)
            .context("Failed to initialize image fetcher")?,
    );

    let scanner = MaintenanceScanner::new(fetcher, store, maintenance_config);
    let summary = scanner.scan(&communities).await;

    report(&summary, args.json, args.dry_run)
}

fn report(summary: &MaintenanceSummary, json: bool, dry_run: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "kept": summary.total_kept(),
            "removed": summary.total_removed(),
            "reports": summary.reports,
            "failures": summary.failures,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let prefix = if dry_run { "[DRY RUN] " } else { "" };

    for report in &summary.reports {
        println!(
            "{}r/{}: kept {}, removed {}",
            prefix, report.community, report.kept, report.removed
        );
        for url in &report.removed_urls {
            println!("    - {}", url);
        }
    }

    for failure in &summary.failures {
        println!("{}r/{}: failed: {}", prefix, failure.community, failure.error);
    }

    Ok(())
}
