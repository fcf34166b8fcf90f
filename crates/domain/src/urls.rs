//! URL normalization and extension matching

use url::Url;

/// Canonical form used as the ledger key
pub fn normalize_url(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Extension of the last path segment, without query or fragment
pub fn extension_of(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Whether the URL ends in one of the configured image formats
pub fn has_supported_extension(url: &str, formats: &[String]) -> bool {
    match extension_of(url) {
        Some(ext) => formats
            .iter()
            .any(|format| format.trim_start_matches('.').eq_ignore_ascii_case(&ext)),
        None => false,
    }
}
