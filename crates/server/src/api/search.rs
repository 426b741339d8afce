//! Full-text search over documents. `source_types` filters client-side
//! after the FTS5 query — BM25 ranking operates on the whole corpus, and
//! a single-source filter would otherwise require a separate index per
//! source type for no real gain at this scale.

use axum::extract::State;
use axum::Json;
use quaero_core::{Document, SourceType};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    source_types: Vec<String>,
}

fn default_limit() -> u32 {
    20
}

pub async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Result<Json<Vec<Document>>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::Invalid("query must not be empty".to_string()));
    }

    let allowed: Vec<SourceType> = request
        .source_types
        .iter()
        .map(|s| SourceType::from_str(s).map_err(ApiError::Invalid))
        .collect::<Result<_>>()?;

    let results = state.storage.documents.full_text_search(&request.query, request.limit)?;
    let filtered = if allowed.is_empty() {
        results
    } else {
        results.into_iter().filter(|doc| allowed.contains(&doc.source_type)).collect()
    };
    Ok(Json(filtered))
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
