//! Transient, per-crawl-job URL queue entries and URL canonicalization.

use serde::{Deserialize, Serialize};
use url::Url;

/// One entry in a crawl job's in-memory URL queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlQueueItem {
    pub url: String,
    pub depth: u32,
    pub discovered_by: Option<String>,
    #[serde(default)]
    pub retries: u32,
}

impl UrlQueueItem {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            discovered_by: None,
            retries: 0,
        }
    }
}

/// Canonicalise a URL: lowercase scheme+host, strip fragments, sort
/// query parameters, drop trailing-slash variance. Malformed URLs are
/// returned unchanged (lowercased) so dedup still degrades gracefully
/// rather than panicking.
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.trim().to_lowercase();
    };

    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let scheme = parsed.scheme().to_lowercase();
    let _ = parsed.set_scheme(&scheme);
    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        let _ = parsed.set_host(Some(&host));
    }

    let mut canonical = parsed.to_string();
    if canonical.ends_with('/') && canonical.matches('/').count() > 2 {
        canonical.pop();
    }
    canonical
}

#[cfg(test)]
#[path = "url_queue_tests.rs"]
mod tests;
