//! Crawl-loop failure vocabulary — separate from `quaero_adapters::ScrapeError`
//! (single-request failures) and `quaero_core::InvariantError` (domain rules).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("crawl seed url is empty")]
    EmptySeed,

    #[error("seed url '{0}' is unreachable: {1}")]
    SeedUnreachable(String, #[source] quaero_adapters::ScrapeError),

    #[error("crawl cancelled")]
    Cancelled,

    #[error(transparent)]
    Scrape(#[from] quaero_adapters::ScrapeError),

    #[error(transparent)]
    Sink(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
