//! Maps every failure vocabulary the server touches (storage, engine,
//! crawler, adapters, core invariants) onto the single `{ "error",
//! "message" }` JSON body the HTTP API promises, picking a status code
//! by error kind rather than by crate of origin.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Engine(#[from] quaero_engine::EngineError),

    #[error(transparent)]
    Storage(#[from] quaero_storage::StorageError),

    #[error(transparent)]
    Llm(#[from] quaero_adapters::LlmError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Engine(quaero_engine::EngineError::DefinitionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            ApiError::Engine(quaero_engine::EngineError::InvalidSchedule(_, _)) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            ApiError::Engine(quaero_engine::EngineError::Invariant(inv)) => invariant_status(inv),
            ApiError::Engine(quaero_engine::EngineError::Storage(err)) => storage_status(err),
            ApiError::Engine(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Storage(err) => storage_status(err),
            ApiError::Llm(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

fn storage_status(err: &quaero_storage::StorageError) -> (StatusCode, &'static str) {
    match err {
        quaero_storage::StorageError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        quaero_storage::StorageError::Invariant(inv) => invariant_status(inv),
        quaero_storage::StorageError::Constraint(_) => (StatusCode::CONFLICT, "conflict"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

fn invariant_status(err: &quaero_core::InvariantError) -> (StatusCode, &'static str) {
    match err {
        quaero_core::InvariantError::DuplicateDefinitionName { .. } => (StatusCode::CONFLICT, "conflict"),
        quaero_core::InvariantError::TerminalJobReTransition { .. } => (StatusCode::CONFLICT, "conflict"),
        _ => (StatusCode::BAD_REQUEST, "invalid_request"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        tracing::warn!(status = %status, error = %self, "request failed");
        (status, Json(ErrorBody { error: code, message: self.to_string() })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
