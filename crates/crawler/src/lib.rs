#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Coordinates a bounded worker pool for one crawl job: URL queue,
//! per-job visited set, depth control, retries, and link-following.
//! Deliberately decoupled from `quaero-storage` — callers inject a
//! [`CrawlSink`] that performs persistence, so this crate's tests never
//! touch a database.

pub mod engine;
pub mod error;
pub mod sink;

pub use engine::{CrawlOutcome, CrawlRunConfig, CrawlerEngine};
pub use error::{CrawlError, Result};
pub use sink::{CrawlSink, ScrapedPage};

#[cfg(any(test, feature = "test-support"))]
pub use sink::{NoopSink, RecordingSink};
