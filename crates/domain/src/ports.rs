//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::ledger::UrlLedger;
use crate::model::{Candidate, Community, DecodedImage, LedgerOrigin};

/// Error type for post listing operations
#[derive(Debug, Error)]
pub enum PostSourceError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for listing a community's top posts
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch up to `limit` top-ranked posts, in provider order
    async fn list_top_posts(
        &self,
        community: &Community,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostSourceError>;
}

/// Error type for image fetch/decode operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, connection failure, 5xx or 429; worth retrying
    #[error("Transient fetch error: {0}")]
    Transient(String),
    /// Malformed URL, other 4xx, undecodable content
    #[error("Fetch failed: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Port for fetching and decoding a remote image
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, FetchError>;
}

/// Error type for ledger persistence
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store error: {0}")]
    Store(String),
}

/// A ledger as read from storage
#[derive(Debug, Clone)]
pub struct LoadedLedger {
    pub ledger: UrlLedger,
    pub origin: LedgerOrigin,
}

impl LoadedLedger {
    pub fn loaded(ledger: UrlLedger) -> Self {
        Self {
            ledger,
            origin: LedgerOrigin::Loaded,
        }
    }

    pub fn missing() -> Self {
        Self {
            ledger: UrlLedger::new(),
            origin: LedgerOrigin::Missing,
        }
    }

    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self {
            ledger: UrlLedger::new(),
            origin: LedgerOrigin::Unreadable {
                reason: reason.into(),
            },
        }
    }
}

/// Port for persisting ledgers and the run summary
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load a community's ledger. Never fails: unreadable storage degrades
    /// to an empty ledger tagged with its origin.
    async fn load(&self, community: &Community) -> LoadedLedger;

    /// Replace the persisted ledger with `ledger` as a whole
    async fn persist(&self, community: &Community, ledger: &UrlLedger) -> Result<(), LedgerError>;

    /// Move an unreadable ledger aside so it survives the next `persist`
    async fn quarantine(&self, community: &Community) -> Result<(), LedgerError>;

    /// Overwrite the run summary with `urls`
    async fn write_summary(&self, urls: &[String]) -> Result<(), LedgerError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
