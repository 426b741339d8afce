//! Shared error vocabulary for invariant violations that cross crate
//! boundaries (storage, engine, and the HTTP API all need to distinguish
//! these the same way).

use thiserror::Error;

/// A structured, never-silently-swallowed invariant violation.
///
/// Distinct from storage I/O errors (`quaero_storage::StorageError`) and
/// scrape/network errors — this is for domain rule violations such as
/// re-transitioning a terminal job or registering a duplicate definition
/// name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("job {id} is already in a terminal state ({status}); cannot transition again")]
    TerminalJobReTransition { id: String, status: String },

    #[error("job definition name '{name}' is already registered")]
    DuplicateDefinitionName { name: String },

    #[error("max_depth {0} exceeds the allowed range [0, 10]")]
    DepthOutOfRange(u32),

    #[error("concurrency {0} exceeds the allowed range [1, 10]")]
    ConcurrencyOutOfRange(u32),

    #[error("source '{0}' has no base_url but is enabled")]
    MissingBaseUrl(String),

    #[error("schedule '{0}' is not parseable: {1}")]
    UnparseableSchedule(String, String),

    #[error("schedule period must be at least 5 minutes, got {0:?}")]
    SchedulePeriodTooShort(std::time::Duration),

    #[error("unknown job type '{0}'")]
    UnknownJobType(String),

    #[error("parent job {parent} references non-existent parent {missing}")]
    OrphanJob { parent: String, missing: String },
}
