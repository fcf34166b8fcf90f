//! Fake port implementations shared by the use case tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use time::OffsetDateTime;

use crate::ledger::{UrlLedger, render_lines};
use crate::model::{Candidate, Community, DecodedImage};
use crate::ports::{
    Clock, FetchError, ImageFetcher, LedgerError, LedgerStore, LoadedLedger, PostSource,
    PostSourceError,
};

pub struct FakePostSource {
    listings: HashMap<String, Result<Vec<Candidate>, PostSourceError>>,
}

impl FakePostSource {
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
        }
    }

    pub fn with_posts(mut self, community: &str, posts: Vec<Candidate>) -> Self {
        self.listings.insert(community.to_string(), Ok(posts));
        self
    }

    pub fn with_error(mut self, community: &str, error: PostSourceError) -> Self {
        self.listings.insert(community.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl PostSource for FakePostSource {
    async fn list_top_posts(
        &self,
        community: &Community,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostSourceError> {
        match self.listings.get(community.as_str()) {
            Some(Ok(posts)) => Ok(posts.iter().take(limit).cloned().collect()),
            Some(Err(error)) => Err(match error {
                PostSourceError::Api(msg) => PostSourceError::Api(msg.clone()),
                PostSourceError::RateLimited(after) => PostSourceError::RateLimited(*after),
                PostSourceError::Auth(msg) => PostSourceError::Auth(msg.clone()),
                PostSourceError::Network(msg) => PostSourceError::Network(msg.clone()),
            }),
            None => Ok(vec![]),
        }
    }
}

#[derive(Clone)]
enum Served {
    Image(DecodedImage),
    Error(FetchError),
}

/// Serves canned images keyed by URL; unknown URLs fail permanently
pub struct FakeFetcher {
    served: HashMap<String, Served>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            served: HashMap::new(),
        }
    }

    pub fn image(mut self, url: &str, image: DecodedImage) -> Self {
        self.served.insert(url.to_string(), Served::Image(image));
        self
    }

    /// A live image whose pixels depend on the URL
    pub fn live(self, url: &str) -> Self {
        let shade = url.bytes().fold(0u8, |acc, b| acc.wrapping_mul(31).wrapping_add(b));
        self.image(url, DecodedImage::solid(40, 30, [shade, shade.wrapping_add(1), 0]))
    }

    /// The host's removed-image placeholder (130 wide, 60 high)
    pub fn deleted(self, url: &str) -> Self {
        self.image(url, DecodedImage::solid(130, 60, [200, 200, 200]))
    }

    pub fn transient(mut self, url: &str) -> Self {
        self.served.insert(
            url.to_string(),
            Served::Error(FetchError::Transient("503 Service Unavailable".to_string())),
        );
        self
    }

    pub fn permanent(mut self, url: &str) -> Self {
        self.served.insert(
            url.to_string(),
            Served::Error(FetchError::Permanent("404 Not Found".to_string())),
        );
        self
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, FetchError> {
        match self.served.get(url) {
            Some(Served::Image(image)) => Ok(image.clone()),
            Some(Served::Error(error)) => Err(error.clone()),
            None => Err(FetchError::Permanent(format!("no image at {}", url))),
        }
    }
}

/// Ledger store holding raw persisted lines per community
pub struct FakeLedgerStore {
    ledgers: Mutex<HashMap<String, Vec<String>>>,
    summary: Mutex<Option<Vec<String>>>,
    failing: HashSet<String>,
    unreadable: Mutex<HashSet<String>>,
    quarantined: Mutex<Vec<String>>,
}

impl FakeLedgerStore {
    pub fn new() -> Self {
        Self {
            ledgers: Mutex::new(HashMap::new()),
            summary: Mutex::new(None),
            failing: HashSet::new(),
            unreadable: Mutex::new(HashSet::new()),
            quarantined: Mutex::new(Vec::new()),
        }
    }

    pub fn with_ledger(community: &str, lines: &[&str]) -> Self {
        Self::new().seed(community, lines)
    }

    pub fn seed(self, community: &str, lines: &[&str]) -> Self {
        self.ledgers.lock().unwrap().insert(
            community.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Loads of `community` report a corrupt ledger until it is quarantined
    pub fn corrupt(self, community: &str) -> Self {
        self.unreadable.lock().unwrap().insert(community.to_string());
        self
    }

    pub fn quarantined(&self) -> Vec<String> {
        self.quarantined.lock().unwrap().clone()
    }

    pub fn failing_persist(mut self, community: &str) -> Self {
        self.failing.insert(community.to_string());
        self
    }

    /// Persisted lines, or None when nothing was ever stored
    pub fn ledger(&self, community: &str) -> Option<Vec<String>> {
        self.ledgers.lock().unwrap().get(community).cloned()
    }

    pub fn summary(&self) -> Option<Vec<String>> {
        self.summary.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for FakeLedgerStore {
    async fn load(&self, community: &Community) -> LoadedLedger {
        if self.unreadable.lock().unwrap().contains(community.as_str()) {
            return LoadedLedger::unreadable("invalid UTF-8");
        }
        match self.ledgers.lock().unwrap().get(community.as_str()) {
            Some(lines) => LoadedLedger::loaded(UrlLedger::parse(&render_lines(lines))),
            None => LoadedLedger::missing(),
        }
    }

    async fn persist(&self, community: &Community, ledger: &UrlLedger) -> Result<(), LedgerError> {
        if self.failing.contains(community.as_str()) {
            return Err(LedgerError::Store("disk full".to_string()));
        }
        self.ledgers
            .lock()
            .unwrap()
            .insert(community.to_string(), ledger.to_vec());
        Ok(())
    }

    async fn quarantine(&self, community: &Community) -> Result<(), LedgerError> {
        self.unreadable.lock().unwrap().remove(community.as_str());
        self.quarantined.lock().unwrap().push(community.to_string());
        Ok(())
    }

    async fn write_summary(&self, urls: &[String]) -> Result<(), LedgerError> {
        *self.summary.lock().unwrap() = Some(urls.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeClock;

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }
}
