//! RAG chat. Retrieval rides on the same BM25 full-text index `search`
//! uses — there's no separate embedding index in storage, so
//! `rag_config.min_similarity` is accepted for API compatibility but has
//! no BM25 equivalent to gate on; `max_documents` and `source_types` are
//! the filters that actually apply.

use axum::extract::State;
use axum::Json;
use quaero_adapters::ChatMessage as LlmChatMessage;
use quaero_core::SourceType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RagConfig {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_max_documents")]
    max_documents: u32,
    #[serde(default)]
    #[allow(dead_code)]
    min_similarity: f32,
    #[serde(default)]
    source_types: Vec<String>,
}

fn default_max_documents() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    rag_config: RagConfig,
}

#[derive(Serialize)]
pub struct ChatResponse {
    reply: String,
    context_document_ids: Vec<String>,
}

pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(ApiError::Invalid("message must not be empty".to_string()));
    }

    let mut messages: Vec<LlmChatMessage> = Vec::new();
    let mut context_document_ids = Vec::new();

    if request.rag_config.enabled {
        let allowed: Vec<SourceType> = request
            .rag_config
            .source_types
            .iter()
            .map(|s| SourceType::from_str(s).map_err(ApiError::Invalid))
            .collect::<Result<_>>()?;

        let hits = state
            .storage
            .documents
            .full_text_search(&request.message, request.rag_config.max_documents)?;
        let hits: Vec<_> = if allowed.is_empty() {
            hits
        } else {
            hits.into_iter().filter(|doc| allowed.contains(&doc.source_type)).collect()
        };

        if !hits.is_empty() {
            let mut context = String::from("Use the following documents to answer the question:\n\n");
            for doc in &hits {
                context.push_str(&format!("## {}\n{}\n\n", doc.title, doc.content_markdown));
                context_document_ids.push(doc.id.as_str().to_string());
            }
            messages.push(LlmChatMessage::system(context));
        }
    }

    for turn in request.history {
        messages.push(LlmChatMessage { role: turn.role, content: turn.content });
    }
    messages.push(LlmChatMessage::user(request.message));

    let reply = state.llm.chat(&messages).await?;

    Ok(Json(ChatResponse { reply, context_document_ids }))
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
