//! Paginated document listing/detail and bulk delete. `content_markdown`
//! is included on every response — there's no separate "summary vs
//! detail" shape, since `Document` has no redundant content fields to
//! trim.

use axum::extract::{Path, Query, State};
use axum::Json;
use quaero_core::{Document, DocumentId, SourceType};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    source_type: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list(State(state): State<AppState>, Query(query): Query<DocumentListQuery>) -> Result<Json<Vec<Document>>> {
    let source_type = query
        .source_type
        .as_deref()
        .map(|s| SourceType::from_str(s).map_err(ApiError::Invalid))
        .transpose()?;
    Ok(Json(state.storage.documents.list_paginated(source_type, query.limit, query.offset)?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>> {
    Ok(Json(state.storage.documents.get(&DocumentId::new(id))?))
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentsRequest {
    ids: Vec<String>,
}

pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteDocumentsRequest>,
) -> Result<Json<u64>> {
    let ids: Vec<DocumentId> = request.ids.into_iter().map(DocumentId::new).collect();
    Ok(Json(state.storage.documents.delete_many(&ids)?))
}

#[cfg(test)]
#[path = "documents_tests.rs"]
mod tests;
