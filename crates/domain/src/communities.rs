//! Community list parsing

use crate::model::{Community, InvalidCommunity};

/// A line of the community list that was not a valid identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub error: InvalidCommunity,
}

/// Parsed community list with the lines that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct CommunityList {
    pub communities: Vec<Community>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse one identifier per line.
///
/// Blank lines and `#` comments are ignored, a leading byte-order mark is
/// tolerated, invalid identifiers are skipped and reported, and repeated
/// identifiers keep their first position.
pub fn parse_community_list(content: &str) -> CommunityList {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut list = CommunityList::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Community::new(line) {
            Ok(community) => {
                if !list.communities.contains(&community) {
                    list.communities.push(community);
                }
            }
            Err(error) => {
                tracing::warn!(line = index + 1, error = %error, "Skipping invalid community");
                list.skipped.push(SkippedLine {
                    line: index + 1,
                    error,
                });
            }
        }
    }

    list
}
