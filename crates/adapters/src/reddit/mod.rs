//! Reddit API adapters

mod read;

pub use read::{RedditCredentials, RedditPostSource};

use async_trait::async_trait;
use img_harvest_domain::{Candidate, Community, PostSource, PostSourceError};

/// Stub post source for offline runs and tests
pub struct StubPostSource {
    posts: Vec<Candidate>,
}

impl StubPostSource {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self { posts: vec![] }
    }

    /// Create a stub serving the same posts for every community
    pub fn with_posts(posts: Vec<Candidate>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl PostSource for StubPostSource {
    async fn list_top_posts(
        &self,
        _community: &Community,
        limit: usize,
    ) -> Result<Vec<Candidate>, PostSourceError> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}
