//! Typed storage failures. Callers distinguish not-found from
//! constraint violations from I/O so they can decide whether to retry —
//! the store itself never retries internally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invariant violation: {0}")]
    Invariant(#[from] quaero_core::InvariantError),

    #[error("database I/O error: {0}")]
    Io(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
