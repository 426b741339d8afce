//! CRUD on source configs. Validation (`base_url` required when
//! enabled, depth/concurrency range) happens in `quaero_core::SourceConfig::validate`,
//! called by the store itself — invalid bodies surface as a 400 via
//! [`ApiError::Engine`]'s invariant mapping.

use axum::extract::{Path, State};
use axum::Json;
use quaero_core::{SourceConfig, SourceId};

use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SourceConfig>>> {
    Ok(Json(state.storage.sources.list()?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SourceConfig>> {
    Ok(Json(state.storage.sources.get(&SourceId::new(id))?))
}

pub async fn create(State(state): State<AppState>, Json(source): Json<SourceConfig>) -> Result<Json<SourceConfig>> {
    Ok(Json(state.storage.sources.create(source)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut source): Json<SourceConfig>,
) -> Result<Json<SourceConfig>> {
    source.id = SourceId::new(id);
    Ok(Json(state.storage.sources.update(source)?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<()>> {
    state.storage.sources.delete(&SourceId::new(id))?;
    Ok(Json(()))
}

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;
