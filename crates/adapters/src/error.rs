//! Scrape/fetch failure vocabulary. Distinct from [`quaero_core::InvariantError`]
//! (domain rule violations) and `quaero_storage::StorageError` (persistence) —
//! this crate only speaks to network and HTML-parsing failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response body for {url} exceeded max_body_size ({limit} bytes)")]
    BodyTooLarge { url: String, limit: u64 },

    #[error("redirect limit exceeded fetching {url}")]
    TooManyRedirects { url: String },

    #[error("url '{0}' could not be parsed")]
    InvalidUrl(String),

    #[error("rate limiter cancelled while waiting for a token for host '{0}'")]
    RateLimitCancelled(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
