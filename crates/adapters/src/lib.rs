#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! External-facing capabilities: HTTP fetch + HTML-to-Markdown
//! conversion, per-host rate limiting, and the LLM chat/embedding
//! client. Everything here is IO; `quaero-core` stays IO-free and these
//! types are injected into the crawler and engine behind traits so
//! tests substitute fakes.

pub mod error;
pub mod llm;
pub mod markdown;
pub mod metadata;
pub mod rate_limiter;
pub mod scraper;

pub use error::{Result, ScrapeError};
pub use llm::{ChatMessage, HttpLlmService, LlmError, LlmService};
pub use metadata::PageMetadata;
pub use rate_limiter::{NoopRateLimiter, RateLimitConfig, RateLimiter, TokenBucketRateLimiter};
pub use scraper::{HtmlScraper, OutputFormat, ReqwestScraper, ScrapeOptions, ScrapeResult};

#[cfg(any(test, feature = "test-support"))]
pub use llm::FakeLlmService;
#[cfg(any(test, feature = "test-support"))]
pub use scraper::FakeScraper;
