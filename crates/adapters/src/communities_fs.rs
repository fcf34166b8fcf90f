//! Community list file loader

use img_harvest_domain::communities::{CommunityList, parse_community_list};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CommunityListError {
    #[error("Failed to read community list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read and parse the one-identifier-per-line community list
pub async fn load_community_list(path: &Path) -> Result<CommunityList, CommunityListError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommunityListError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let list = parse_community_list(&content);
    tracing::info!(
        path = %path.display(),
        communities = list.communities.len(),
        skipped = list.skipped.len(),
        "Loaded community list"
    );
    Ok(list)
}
