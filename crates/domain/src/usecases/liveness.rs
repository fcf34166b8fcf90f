//! Liveness classification of remote images

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep, timeout};

use crate::model::{DecodedImage, Liveness};
use crate::ports::{FetchError, ImageFetcher};

/// Pixel dimensions of the host's "image removed" placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSignature {
    pub height: u32,
    pub width: u32,
}

impl Default for PlaceholderSignature {
    fn default() -> Self {
        Self {
            height: 60,
            width: 130,
        }
    }
}

impl PlaceholderSignature {
    pub fn matches(&self, image: &DecodedImage) -> bool {
        image.height == self.height && image.width == self.width
    }
}

/// Configuration for the liveness classifier
#[derive(Debug, Clone)]
pub struct LivenessConfig {
    pub placeholder: PlaceholderSignature,
    /// Bound on a single fetch attempt
    pub timeout: Duration,
    /// Total attempts per URL for transient failures
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
    /// Max fetches per second across all URLs (None = unlimited)
    pub max_requests_per_second: Option<f64>,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderSignature::default(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            max_requests_per_second: Some(2.0),
        }
    }
}

/// Classification together with the decoded image, when there was one
#[derive(Debug, Clone)]
pub struct Inspection {
    pub liveness: Liveness,
    pub image: Option<DecodedImage>,
}

/// Classifies image URLs as live or deleted using the placeholder heuristic
pub struct LivenessClassifier<F: ImageFetcher + ?Sized> {
    fetcher: Arc<F>,
    config: LivenessConfig,
    rate_limiter: RateLimiter,
}

impl<F: ImageFetcher + ?Sized> LivenessClassifier<F> {
    pub fn new(fetcher: Arc<F>, config: LivenessConfig) -> Self {
        let rate_limiter = RateLimiter::per_second(config.max_requests_per_second);
        Self {
            fetcher,
            config,
            rate_limiter,
        }
    }

    pub async fn classify(&self, url: &str) -> Liveness {
        self.inspect(url).await.liveness
    }

    pub async fn inspect(&self, url: &str) -> Inspection {
        match self.fetch(url).await {
            Ok(image) => {
                let liveness = self.judge(&image);
                Inspection {
                    liveness,
                    image: Some(image),
                }
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Image fetch failed");
                Inspection {
                    liveness: Liveness::Unknown,
                    image: None,
                }
            }
        }
    }

    pub fn judge(&self, image: &DecodedImage) -> Liveness {
        if self.config.placeholder.matches(image) {
            Liveness::Deleted
        } else {
            Liveness::Live
        }
    }

    /// Throttled fetch with timeout and retry on transient failures
    pub async fn fetch(&self, url: &str) -> Result<DecodedImage, FetchError> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::debug!(url = %url, attempt = attempt, "Retrying image fetch");
                sleep(self.config.backoff).await;
            }

            self.rate_limiter.acquire().await;

            let result = match timeout(self.config.timeout, self.fetcher.fetch_and_decode(url)).await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Transient(format!(
                    "timed out after {:?}",
                    self.config.timeout
                ))),
            };

            match result {
                Ok(image) => return Ok(image),
                Err(error) if error.is_transient() => last_error = Some(error),
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Transient("no attempts made".to_string())))
    }
}

/// Spaces calls at least `min_interval` apart
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Option<Duration>) -> Self {
        Self {
            min_interval: min_interval.filter(|interval| !interval.is_zero()),
            next_slot: Mutex::new(None),
        }
    }

    /// Non-positive or missing rates disable throttling, as do rates too
    /// small for their interval to fit in a `Duration`
    pub fn per_second(rate: Option<f64>) -> Self {
        let interval = rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .and_then(|rate| Duration::try_from_secs_f64(1.0 / rate).ok());
        Self::new(interval)
    }

    pub async fn acquire(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };

        let wait_for = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(slot + interval);
            slot - now
        };

        if !wait_for.is_zero() {
            sleep(wait_for).await;
        }
    }
}
