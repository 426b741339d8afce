//! Engine-level failure vocabulary: job-lifecycle and scheduling
//! failures that sit above storage and the crawler's own error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] quaero_storage::StorageError),

    #[error(transparent)]
    Invariant(#[from] quaero_core::InvariantError),

    #[error("job definition '{0}' not found")]
    DefinitionNotFound(String),

    #[error("job definition '{0}' has an invalid schedule: {1}")]
    InvalidSchedule(String, String),

    #[error("no executor registered for job kind '{0}'")]
    NoExecutor(String),

    #[error(transparent)]
    Crawl(#[from] quaero_crawler::CrawlError),

    #[error(transparent)]
    Llm(#[from] quaero_adapters::LlmError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
