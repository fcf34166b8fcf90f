//! Reconciliation use case - admits new live image links into each ledger

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ledger::UrlLedger,
    model::{
        Candidate, CandidateOutcome, Community, CommunityFailure, CommunityReport, DecodedImage,
        LedgerOrigin, Liveness, RejectReason, RunSummary, SkipReason,
    },
    ports::{Clock, FetchError, ImageFetcher, LedgerError, LedgerStore, LoadedLedger, PostSource},
    urls::{has_supported_extension, normalize_url},
    usecases::{
        compare::images_equal,
        liveness::{LivenessClassifier, LivenessConfig},
    },
};

/// Configuration for a reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Top posts requested per community
    pub post_limit: usize,
    /// Accepted image extensions
    pub supported_formats: Vec<String>,
    /// Domains the liveness heuristic cannot judge
    pub excluded_domains: Vec<String>,
    /// Also reject live images pixel-identical to an existing entry
    pub compare_duplicates: bool,
    /// Skip all persistence
    pub dry_run: bool,
    pub liveness: LivenessConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            post_limit: 20,
            supported_formats: vec!["jpg".to_string(), "png".to_string(), "jpeg".to_string()],
            excluded_domains: vec!["i.imgur.com".to_string()],
            compare_duplicates: false,
            dry_run: false,
            liveness: LivenessConfig::default(),
        }
    }
}

/// Errors that end a single community's pass
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Failed to persist ledger for {community}: {source}")]
    Persist {
        community: Community,
        #[source]
        source: LedgerError,
    },
    #[error("Failed to write run summary: {0}")]
    Summary(#[source] LedgerError),
}

/// Reconciliation orchestrator
pub struct ReconciliationEngine<S, F, L, Cl>
where
    S: PostSource + ?Sized,
    F: ImageFetcher + ?Sized,
    L: LedgerStore + ?Sized,
    Cl: Clock + ?Sized,
{
    post_source: Arc<S>,
    classifier: LivenessClassifier<F>,
    store: Arc<L>,
    clock: Arc<Cl>,
    config: ReconcileConfig,
}

impl<S, F, L, Cl> ReconciliationEngine<S, F, L, Cl>
where
    S: PostSource + ?Sized,
    F: ImageFetcher + ?Sized,
    L: LedgerStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        post_source: Arc<S>,
        fetcher: Arc<F>,
        store: Arc<L>,
        clock: Arc<Cl>,
        config: ReconcileConfig,
    ) -> Self {
        let classifier = LivenessClassifier::new(fetcher, config.liveness.clone());
        Self {
            post_source,
            classifier,
            store,
            clock,
            config,
        }
    }

    /// Reconcile every community in order, then overwrite the run summary.
    ///
    /// Community failures are recorded in the summary and never stop the run.
    pub async fn run(&self, communities: &[Community]) -> Result<RunSummary, ReconcileError> {
        let run_id = Uuid::new_v4();
        let started_at = self.clock.now();
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        tracing::info!(run_id = %run_id, communities = communities.len(), "Starting collection run");

        for community in communities {
            match self.reconcile_community(community).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(community = %community, error = %e, "Community failed");
                    failures.push(CommunityFailure {
                        community: community.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: self.clock.now(),
            communities: reports,
            failures,
        };

        let new_images = summary.new_images();
        if self.config.dry_run {
            tracing::info!(count = new_images.len(), "[DRY RUN] Would write run summary");
        } else {
            self.store
                .write_summary(&new_images)
                .await
                .map_err(ReconcileError::Summary)?;
        }

        tracing::info!(
            run_id = %run_id,
            added = summary.total_added(),
            failed = summary.failures.len(),
            "Collection run complete"
        );

        Ok(summary)
    }

    /// Reconcile one community's top posts against its ledger
    pub async fn reconcile_community(
        &self,
        community: &Community,
    ) -> Result<CommunityReport, ReconcileError> {
        let LoadedLedger { mut ledger, origin } = self.store.load(community).await;
        log_origin(community, &origin, ledger.len());

        let candidates = match self
            .post_source
            .list_top_posts(community, self.config.post_limit)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(community = %community, error = %e, "Failed to list posts");
                return Ok(CommunityReport {
                    community: community.clone(),
                    new_images: vec![],
                    ledger: ledger.to_vec(),
                    outcomes: vec![],
                    provider_error: Some(e.to_string()),
                    ledger_origin: origin,
                });
            }
        };

        tracing::info!(community = %community, count = candidates.len(), "Fetched posts");

        let mut new_images = Vec::new();
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let url = normalize_url(&candidate.url);
            let outcome = self.process_candidate(candidate, &mut ledger).await;
            log_outcome(community, &url, &outcome, new_images.len() + 1);
            if outcome == CandidateOutcome::Admitted {
                new_images.push(url.clone());
            }
            outcomes.push((url, outcome));
        }

        tracing::info!(community = %community, added = new_images.len(), "Finished community");

        if self.config.dry_run {
            tracing::info!(community = %community, entries = ledger.len(), "[DRY RUN] Would persist ledger");
        } else {
            if matches!(origin, LedgerOrigin::Unreadable { .. }) {
                // The old file must not be overwritten by this run's admissions alone
                self.store
                    .quarantine(community)
                    .await
                    .map_err(|source| ReconcileError::Persist {
                        community: community.clone(),
                        source,
                    })?;
                tracing::warn!(community = %community, "Moved unreadable ledger aside");
            }
            self.store
                .persist(community, &ledger)
                .await
                .map_err(|source| ReconcileError::Persist {
                    community: community.clone(),
                    source,
                })?;
        }

        Ok(CommunityReport {
            community: community.clone(),
            new_images,
            ledger: ledger.to_vec(),
            outcomes,
            provider_error: None,
            ledger_origin: origin,
        })
    }

    /// Decide a candidate's fate and admit it into `ledger` when live
    async fn process_candidate(
        &self,
        candidate: &Candidate,
        ledger: &mut UrlLedger,
    ) -> CandidateOutcome {
        let outcome = match self.evaluate(candidate, ledger).await {
            Ok(outcome) => outcome,
            Err(e) => CandidateOutcome::Rejected {
                reason: RejectReason::Failed {
                    error: e.to_string(),
                },
            },
        };

        if outcome == CandidateOutcome::Admitted {
            ledger.insert(&candidate.url);
        }
        outcome
    }

    async fn evaluate(
        &self,
        candidate: &Candidate,
        ledger: &UrlLedger,
    ) -> Result<CandidateOutcome, FetchError> {
        let url = normalize_url(&candidate.url);

        if !has_supported_extension(&url, &self.config.supported_formats) {
            return Ok(CandidateOutcome::Rejected {
                reason: RejectReason::UnsupportedExtension,
            });
        }

        if ledger.contains(&url) {
            return Ok(CandidateOutcome::AlreadyExists);
        }

        if self.is_excluded(&candidate.domain) {
            return Ok(CandidateOutcome::Rejected {
                reason: RejectReason::ExcludedDomain {
                    domain: candidate.domain.clone(),
                },
            });
        }

        let inspection = self.classifier.inspect(&url).await;
        let image = match (inspection.liveness, inspection.image) {
            (Liveness::Live, Some(image)) => image,
            (Liveness::Deleted, _) => {
                return Ok(CandidateOutcome::Skipped {
                    reason: SkipReason::Deleted,
                });
            }
            _ => {
                return Ok(CandidateOutcome::Skipped {
                    reason: SkipReason::Unknown,
                });
            }
        };

        if self.config.compare_duplicates {
            if let Some(of) = self.find_duplicate(&image, ledger).await? {
                return Ok(CandidateOutcome::Rejected {
                    reason: RejectReason::DuplicateImage { of },
                });
            }
        }

        Ok(CandidateOutcome::Admitted)
    }

    fn is_excluded(&self, domain: &str) -> bool {
        let domain = domain.trim();
        self.config
            .excluded_domains
            .iter()
            .any(|excluded| excluded.trim().eq_ignore_ascii_case(domain))
    }

    /// First ledger entry serving a pixel-identical image
    async fn find_duplicate(
        &self,
        image: &DecodedImage,
        ledger: &UrlLedger,
    ) -> Result<Option<String>, FetchError> {
        for existing in ledger.iter() {
            let other = self.classifier.fetch(existing).await?;
            if images_equal(image, &other) {
                return Ok(Some(existing.to_string()));
            }
        }
        Ok(None)
    }
}

pub(crate) fn log_origin(community: &Community, origin: &LedgerOrigin, entries: usize) {
    match origin {
        LedgerOrigin::Loaded => {
            tracing::info!(community = %community, entries = entries, "Loaded ledger");
        }
        LedgerOrigin::Missing => {
            tracing::info!(community = %community, "No ledger yet, starting empty");
        }
        LedgerOrigin::Unreadable { reason } => {
            tracing::error!(
                community = %community,
                reason = %reason,
                "Ledger unreadable, continuing with an empty ledger"
            );
        }
    }
}

fn log_outcome(community: &Community, url: &str, outcome: &CandidateOutcome, next_id: usize) {
    match outcome {
        CandidateOutcome::Admitted => {
            tracing::info!(community = %community, id = next_id, url = %url, "Added");
        }
        CandidateOutcome::AlreadyExists => {
            tracing::info!(community = %community, url = %url, "Already exists");
        }
        CandidateOutcome::Rejected {
            reason: RejectReason::Failed { error },
        } => {
            tracing::error!(community = %community, url = %url, error = %error, "Image failed");
        }
        CandidateOutcome::Rejected { reason } => {
            tracing::info!(community = %community, url = %url, reason = %reason, "Rejected");
        }
        CandidateOutcome::Skipped { reason } => {
            tracing::info!(community = %community, url = %url, reason = ?reason, "Skipped");
        }
    }
}
