//! Collect command - reconcile top posts into the per-community ledgers

use anyhow::{Context, Result, bail};
use img_harvest_adapters::{
    images::HttpImageFetcher,
    ledger::FsLedgerStore,
    reddit::{RedditCredentials, RedditPostSource, StubPostSource},
};
use img_harvest_domain::{
    CandidateOutcome, PostSource, RunSummary, SystemClock,
    usecases::ReconciliationEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::args::CollectArgs;
use crate::commands::{load_communities, load_env, load_secret};
use crate::config::AppConfig;

type Engine = ReconciliationEngine<dyn PostSource, HttpImageFetcher, FsLedgerStore, SystemClock>;

pub async fn execute(args: CollectArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let reconcile_config = config.reconcile_config(args.dry_run)?;
    let dry_run = reconcile_config.dry_run;

    let communities = load_communities(&config).await?;
    let summary_path = args
        .summary
        .clone()
        .unwrap_or_else(|| config.general.summary_file.clone());

    tracing::info!(
        dry_run = dry_run,
        watch = args.watch,
        communities = communities.len(),
        provider = %config.reddit.provider,
        summary = %summary_path.display(),
        "Starting img-harvest collect"
    );

    // Build dependencies
    let store = Arc::new(FsLedgerStore::new(&config.general.data_dir, summary_path));
    let fetcher = Arc::new(
        HttpImageFetcher::new(reconcile_config.liveness.timeout, &config.reddit.user_agent)
            .context("Failed to initialize image fetcher")?,
    );
    let post_source = build_post_source(&config).await?;

    let engine: Engine = ReconciliationEngine::new(
        post_source,
        fetcher,
        store,
        Arc::new(SystemClock),
        reconcile_config,
    );

    if !args.watch {
        let summary = engine
            .run(&communities)
            .await
            .context("Collection run failed")?;
        report(&summary, args.json, dry_run)?;
    } else {
        let poll_interval = Duration::from_secs(config.general.poll_interval_secs.max(1));
        let mut ticker = interval(poll_interval);

        // Set up graceful shutdown
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
            tracing::info!("Shutdown signal received");
        };

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match engine.run(&communities).await {
                        Ok(summary) => report(&summary, args.json, dry_run)?,
                        Err(e) => tracing::error!(error = %e, "Collection run failed"),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down gracefully");
                    break;
                }
            }
        }
    }

    tracing::info!("img-harvest collect completed");
    Ok(())
}

async fn build_post_source(config: &AppConfig) -> Result<Arc<dyn PostSource>> {
    match config.reddit.provider.trim() {
        "stub" => {
            tracing::warn!("Using stub post source; no posts will be listed");
            Ok(Arc::new(StubPostSource::empty()))
        }
        "reddit" => {
            let reddit = &config.reddit;
            let credentials = RedditCredentials {
                client_id: load_env(&reddit.client_id_env, "reddit client id")?,
                client_secret: load_secret(&reddit.client_secret_env, "reddit client secret")?,
                username: load_env(&reddit.username_env, "reddit username")?,
                password: load_secret(&reddit.password_env, "reddit password")?,
                user_agent: reddit.user_agent.clone(),
            };

            let source = RedditPostSource::with_base_urls(
                credentials,
                reddit.auth_base_url.trim_end_matches('/').to_string(),
                reddit.api_base_url.trim_end_matches('/').to_string(),
            )
            .context("Failed to initialize Reddit client")?;

            source
                .authenticate()
                .await
                .context("Reddit authentication failed")?;

            Ok(Arc::new(source))
        }
        other => bail!("Unknown post provider: {}", other),
    }
}

fn report(summary: &RunSummary, json: bool, dry_run: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let prefix = if dry_run { "[DRY RUN] " } else { "" };

    for community in &summary.communities {
        if let Some(error) = &community.provider_error {
            println!("{}r/{}: listing failed: {}", prefix, community.community, error);
            continue;
        }

        let skipped = community
            .outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, CandidateOutcome::Admitted))
            .count();
        println!(
            "{}r/{}: {} added, {} not admitted, {} in ledger",
            prefix,
            community.community,
            community.added(),
            skipped,
            community.ledger.len()
        );
    }

    for failure in &summary.failures {
        println!("{}r/{}: failed: {}", prefix, failure.community, failure.error);
    }

    println!(
        "{}{} new image(s) across {} communities",
        prefix,
        summary.total_added(),
        summary.communities.len()
    );

    if !summary.failures.is_empty() {
        tracing::warn!(failed = summary.failures.len(), "Some communities were not saved");
    }

    Ok(())
}
