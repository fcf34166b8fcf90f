//! Domain models and value objects

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use time::OffsetDateTime;
use uuid::Uuid;

/// Longest community name the listing host accepts
pub const MAX_COMMUNITY_LEN: usize = 21;

static COMMUNITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Valid regex"));

/// A named discussion board whose top posts are collected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Community(String);

impl Community {
    /// Validate and wrap a community identifier
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidCommunity> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_COMMUNITY_LEN {
            return Err(InvalidCommunity::Length { name });
        }
        if !COMMUNITY_PATTERN.is_match(&name) {
            return Err(InvalidCommunity::Charset { name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Community {
    type Error = InvalidCommunity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Community> for String {
    fn from(value: Community) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCommunity {
    #[error("Invalid community '{name}': length must be 1..={max}", max = MAX_COMMUNITY_LEN)]
    Length { name: String },
    #[error("Invalid community '{name}': must match [A-Za-z0-9_-]+")]
    Charset { name: String },
}

/// A post link observed from the listing provider, not yet reconciled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Link target of the post
    pub url: String,
    /// Domain the link points at, as reported by the provider
    pub domain: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            domain: domain.into(),
        }
    }
}

/// A decoded image with an interleaved RGB8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    #[cfg(test)]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let pixels = rgb.iter().copied().cycle().take(count * 3).collect();
        Self::new(width, height, pixels)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Whether a linked image still resolves to real content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Live,
    Deleted,
    Unknown,
}

/// Why a candidate was structurally refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RejectReason {
    UnsupportedExtension,
    ExcludedDomain { domain: String },
    DuplicateImage { of: String },
    Failed { error: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedExtension => f.write_str("unsupported extension"),
            Self::ExcludedDomain { domain } => write!(f, "excluded domain {}", domain),
            Self::DuplicateImage { of } => write!(f, "same image as {}", of),
            Self::Failed { error } => write!(f, "processing failed: {}", error),
        }
    }
}

/// Why a candidate was passed over after a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Deleted,
    Unknown,
}

/// Outcome of reconciling a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CandidateOutcome {
    Admitted,
    AlreadyExists,
    Rejected { reason: RejectReason },
    Skipped { reason: SkipReason },
}

/// How the ledger for a community came into memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "origin")]
pub enum LedgerOrigin {
    /// Read from the persisted file
    Loaded,
    /// No persisted file yet (first run)
    Missing,
    /// A persisted file exists but could not be read; treated as empty
    Unreadable { reason: String },
}

/// Result of one community's reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReport {
    pub community: Community,
    /// URLs admitted during this pass, in provider order
    pub new_images: Vec<String>,
    /// Ledger contents after the pass
    pub ledger: Vec<String>,
    /// Per-candidate outcomes, in provider order
    pub outcomes: Vec<(String, CandidateOutcome)>,
    /// Set when the provider failed and the community contributed nothing
    pub provider_error: Option<String>,
    pub ledger_origin: LedgerOrigin,
}

impl CommunityReport {
    pub fn added(&self) -> usize {
        self.new_images.len()
    }
}

/// A community whose pass could not complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityFailure {
    pub community: Community,
    pub error: String,
}

/// Everything one reconciliation run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub communities: Vec<CommunityReport>,
    pub failures: Vec<CommunityFailure>,
}

impl RunSummary {
    /// All admitted URLs across communities, in processing order
    pub fn new_images(&self) -> Vec<String> {
        self.communities
            .iter()
            .flat_map(|c| c.new_images.iter().cloned())
            .collect()
    }

    pub fn total_added(&self) -> usize {
        self.communities.iter().map(CommunityReport::added).sum()
    }
}

/// Result of one community's maintenance scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub community: Community,
    pub kept: usize,
    pub removed: usize,
    pub removed_urls: Vec<String>,
    pub ledger_origin: LedgerOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_accepts_conservative_charset() {
        assert!(Community::new("Genshin_Wallpaper").is_ok());
        assert!(Community::new("pixel-art").is_ok());
        assert!(Community::new("abc123").is_ok());
    }

    #[test]
    fn test_community_rejects_bad_names() {
        assert!(matches!(
            Community::new(""),
            Err(InvalidCommunity::Length { .. })
        ));
        assert!(matches!(
            Community::new("a".repeat(MAX_COMMUNITY_LEN + 1)),
            Err(InvalidCommunity::Length { .. })
        ));
        assert!(matches!(
            Community::new("r/pics"),
            Err(InvalidCommunity::Charset { .. })
        ));
        assert!(matches!(
            Community::new("has space"),
            Err(InvalidCommunity::Charset { .. })
        ));
    }

    #[test]
    fn test_solid_image_buffer_size() {
        let img = DecodedImage::solid(4, 3, [1, 2, 3]);
        assert_eq!(img.pixels.len(), 36);
        assert_eq!(&img.pixels[..6], &[1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_run_summary_union_keeps_order() {
        let report = |name: &str, urls: &[&str]| CommunityReport {
            community: Community::new(name).unwrap(),
            new_images: urls.iter().map(|u| u.to_string()).collect(),
            ledger: vec![],
            outcomes: vec![],
            provider_error: None,
            ledger_origin: LedgerOrigin::Missing,
        };
        let now = OffsetDateTime::now_utc();
        let summary = RunSummary {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            communities: vec![report("a", &["u1", "u2"]), report("b", &["u3"])],
            failures: vec![],
        };

        assert_eq!(summary.new_images(), vec!["u1", "u2", "u3"]);
        assert_eq!(summary.total_added(), 3);
    }
}
