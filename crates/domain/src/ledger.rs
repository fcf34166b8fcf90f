//! Per-community ordered set of already-seen URLs

use std::collections::HashSet;

use crate::urls::normalize_url;

/// Ordered, duplicate-free set of normalized URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlLedger {
    order: Vec<String>,
    members: HashSet<String>,
}

impl UrlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted line format.
    ///
    /// Lines are trimmed and normalized; blank lines, `#` comments and
    /// repeated entries are dropped. A leading byte-order mark is ignored.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut ledger = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            ledger.insert(line);
        }
        ledger
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(&normalize_url(url))
    }

    /// Append `url` unless already present. Returns true if it was added.
    pub fn insert(&mut self, url: &str) -> bool {
        let url = normalize_url(url);
        if url.is_empty() || self.members.contains(&url) {
            return false;
        }
        self.members.insert(url.clone());
        self.order.push(url);
        true
    }

    /// Remove `url` if present. Returns true if it was removed.
    pub fn remove(&mut self, url: &str) -> bool {
        let url = normalize_url(url);
        if !self.members.remove(&url) {
            return false;
        }
        self.order.retain(|existing| existing != &url);
        true
    }

    /// Keep only the entries for which `keep` returns true, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let members = &mut self.members;
        self.order.retain(|url| {
            let kept = keep(url);
            if !kept {
                members.remove(url);
            }
            kept
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Render in the persisted line format (one URL per line)
    pub fn to_lines(&self) -> String {
        render_lines(&self.order)
    }
}

impl<'a> FromIterator<&'a str> for UrlLedger {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut ledger = Self::new();
        for url in iter {
            ledger.insert(url);
        }
        ledger
    }
}

/// Render URLs one per line with a trailing newline
pub fn render_lines<S: AsRef<str>>(urls: &[S]) -> String {
    let mut out = String::new();
    for url in urls {
        out.push_str(url.as_ref());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_comment_and_bom() {
        let ledger = UrlLedger::parse("\u{feff}http://x/a.jpg\n\n# note\n  http://x/b.png  \n");
        assert_eq!(ledger.to_vec(), vec!["http://x/a.jpg", "http://x/b.png"]);
    }

    #[test]
    fn test_parse_normalizes_and_dedups() {
        let ledger = UrlLedger::parse("HTTP://X/A.jpg\nhttp://x/a.jpg\r\nhttp://x/c.png\r\n");
        assert_eq!(ledger.to_vec(), vec!["http://x/a.jpg", "http://x/c.png"]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut ledger = UrlLedger::new();
        assert!(ledger.insert("http://x/a.jpg"));
        assert!(!ledger.insert("http://x/a.jpg"));
        assert!(!ledger.insert("HTTP://X/A.JPG"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_insert_preserves_order() {
        let ledger: UrlLedger = ["u3", "u1", "u2"].into_iter().collect();
        assert_eq!(ledger.to_vec(), vec!["u3", "u1", "u2"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut ledger: UrlLedger = ["u1", "u2"].into_iter().collect();
        assert!(!ledger.remove("u9"));
        assert!(ledger.remove("u1"));
        assert!(!ledger.contains("u1"));
        assert_eq!(ledger.to_vec(), vec!["u2"]);
    }

    #[test]
    fn test_retain_keeps_membership_in_sync() {
        let mut ledger: UrlLedger = ["u1", "u2", "u3"].into_iter().collect();
        ledger.retain(|url| url != "u2");
        assert_eq!(ledger.to_vec(), vec!["u1", "u3"]);
        assert!(!ledger.contains("u2"));
        assert!(ledger.insert("u2"));
    }

    #[test]
    fn test_to_lines_matches_parse() {
        let ledger: UrlLedger = ["u1", "u2"].into_iter().collect();
        assert_eq!(ledger.to_lines(), "u1\nu2\n");
        assert_eq!(UrlLedger::parse(&ledger.to_lines()), ledger);
    }
}
