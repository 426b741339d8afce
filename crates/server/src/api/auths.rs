//! CRUD on auth snapshots. `POST` is the endpoint the browser extension
//! hits directly (in addition to the WebSocket `auth` frame, §4.11);
//! both paths land on the same [`quaero_storage::AuthStore::save`]
//! replace-wholesale semantics.

use axum::extract::{Path, State};
use axum::Json;
use quaero_core::{AuthId, AuthSnapshot};

use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<AuthSnapshot>>> {
    Ok(Json(state.storage.auth.list()?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<AuthSnapshot>> {
    Ok(Json(state.storage.auth.resolve(&AuthId::new(id))?))
}

pub async fn create(State(state): State<AppState>, Json(snapshot): Json<AuthSnapshot>) -> Result<Json<AuthSnapshot>> {
    Ok(Json(state.storage.auth.save(snapshot)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut snapshot): Json<AuthSnapshot>,
) -> Result<Json<AuthSnapshot>> {
    snapshot.id = AuthId::new(id);
    Ok(Json(state.storage.auth.save(snapshot)?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<()>> {
    state.storage.auth.delete(&AuthId::new(id))?;
    Ok(Json(()))
}

#[cfg(test)]
#[path = "auths_tests.rs"]
mod tests;
