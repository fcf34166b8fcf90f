//! Maintenance scan - prunes ledger entries whose images are gone

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    model::{Community, CommunityFailure, LedgerOrigin, Liveness, ScanReport},
    ports::{ImageFetcher, LedgerError, LedgerStore, LoadedLedger},
    usecases::{
        liveness::{LivenessClassifier, LivenessConfig},
        reconcile::log_origin,
    },
};

/// Configuration for the maintenance scan
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Prune entries whose liveness could not be determined
    pub prune_unknown: bool,
    /// Skip persistence
    pub dry_run: bool,
    pub liveness: LivenessConfig,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            prune_unknown: true,
            dry_run: false,
            liveness: LivenessConfig::default(),
        }
    }
}

/// Aggregate of one scan over all communities
#[derive(Debug, Clone, Default)]
pub struct MaintenanceSummary {
    pub reports: Vec<ScanReport>,
    pub failures: Vec<CommunityFailure>,
}

impl MaintenanceSummary {
    pub fn total_removed(&self) -> usize {
        self.reports.iter().map(|r| r.removed).sum()
    }

    pub fn total_kept(&self) -> usize {
        self.reports.iter().map(|r| r.kept).sum()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to persist ledger for {community}: {source}")]
pub struct MaintenanceError {
    pub community: Community,
    #[source]
    pub source: LedgerError,
}

/// Re-checks every ledgered URL and keeps only the live ones
pub struct MaintenanceScanner<F, L>
where
    F: ImageFetcher + ?Sized,
    L: LedgerStore + ?Sized,
{
    classifier: LivenessClassifier<F>,
    store: Arc<L>,
    config: MaintenanceConfig,
}

impl<F, L> MaintenanceScanner<F, L>
where
    F: ImageFetcher + ?Sized,
    L: LedgerStore + ?Sized,
{
    pub fn new(fetcher: Arc<F>, store: Arc<L>, config: MaintenanceConfig) -> Self {
        let classifier = LivenessClassifier::new(fetcher, config.liveness.clone());
        Self {
            classifier,
            store,
            config,
        }
    }

    pub async fn scan(&self, communities: &[Community]) -> MaintenanceSummary {
        let mut summary = MaintenanceSummary::default();

        for community in communities {
            match self.scan_community(community).await {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    tracing::error!(community = %community, error = %e, "Scan failed");
                    summary.failures.push(CommunityFailure {
                        community: community.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            kept = summary.total_kept(),
            removed = summary.total_removed(),
            failed = summary.failures.len(),
            "Maintenance scan complete"
        );

        summary
    }

    pub async fn scan_community(
        &self,
        community: &Community,
    ) -> Result<ScanReport, MaintenanceError> {
        let LoadedLedger { mut ledger, origin } = self.store.load(community).await;
        log_origin(community, &origin, ledger.len());

        // Nothing was read, so there is nothing to rewrite
        if origin != LedgerOrigin::Loaded {
            return Ok(ScanReport {
                community: community.clone(),
                kept: 0,
                removed: 0,
                removed_urls: vec![],
                ledger_origin: origin,
            });
        }

        tracing::info!(community = %community, entries = ledger.len(), "Scanning ledger");

        let mut removed_urls = Vec::new();
        let mut kept = 0;

        for url in ledger.iter() {
            let liveness = self.classifier.classify(url).await;
            if self.keeps(liveness) {
                kept += 1;
                tracing::info!(community = %community, id = kept, url = %url, "Keep");
            } else {
                tracing::info!(community = %community, url = %url, liveness = ?liveness, "Remove");
                removed_urls.push(url.to_string());
            }
        }

        let removed: HashSet<&str> = removed_urls.iter().map(String::as_str).collect();
        ledger.retain(|url| !removed.contains(url));

        tracing::info!(
            community = %community,
            kept = kept,
            removed = removed_urls.len(),
            "Finished scanning"
        );

        if self.config.dry_run {
            tracing::info!(community = %community, "[DRY RUN] Would persist ledger");
        } else {
            self.store
                .persist(community, &ledger)
                .await
                .map_err(|source| MaintenanceError {
                    community: community.clone(),
                    source,
                })?;
        }

        Ok(ScanReport {
            community: community.clone(),
            kept,
            removed: removed_urls.len(),
            removed_urls,
            ledger_origin: origin,
        })
    }

    fn keeps(&self, liveness: Liveness) -> bool {
        match liveness {
            Liveness::Live => true,
            Liveness::Deleted => false,
            Liveness::Unknown => !self.config.prune_unknown,
        }
    }
}
