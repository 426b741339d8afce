//! `LLMService`: the external chat/embedding capability. Per the
//! specification this is a collaborator, not core engineering — the
//! model internals live outside this repo. What lives here is the thin
//! HTTP client boundary the summariser executor and the chat/RAG API
//! call through, so both can be exercised against a fake in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm endpoint request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("llm endpoint returned an unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }
}

/// Capability boundary for the chat model and the embedding model.
/// Both calls take the full message history / text up front — streaming
/// is a UI concern handled above this trait, not part of the contract.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Talks to an Ollama-compatible `/api/chat` and `/api/embeddings`
/// endpoint, matching the defaults in `quaero_core::LlmConfig`.
pub struct HttpLlmService {
    client: reqwest::Client,
    endpoint: String,
    chat_model: String,
    embedding_model: String,
}

impl HttpLlmService {
    pub fn new(endpoint: impl Into<String>, chat_model: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
        }
    }

    pub fn from_config(config: &quaero_core::LlmConfig) -> Self {
        Self::new(&config.endpoint, &config.chat_model, &config.embedding_model)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl LlmService for HttpLlmService {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint.trim_end_matches('/')))
            .json(&ChatRequest {
                model: &self.chat_model,
                messages,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;
        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.endpoint.trim_end_matches('/')))
            .json(&EmbeddingRequest {
                model: &self.embedding_model,
                prompt: text,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;
        Ok(response.embedding)
    }
}

/// Deterministic stand-in for tests: echoes a canned reply and a
/// length-derived "embedding" so callers can assert on shape without a
/// live model.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeLlmService {
    pub reply: String,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeLlmService {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl LlmService for FakeLlmService {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok(self.reply.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.len() as f32])
    }
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
