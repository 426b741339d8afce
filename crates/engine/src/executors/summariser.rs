//! Walks documents lacking `metadata.summary`, asks the configured LLM
//! for a short summary and keyword list, and writes them back. Skips
//! anything touched more recently than the freshness window so a
//! re-run doesn't re-summarise the whole corpus every time.

use async_trait::async_trait;
use chrono::Duration;
use quaero_adapters::{ChatMessage, LlmService};
use quaero_core::{CancelToken, Clock, Job};
use quaero_storage::StorageManager;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::JobExecutor;
use crate::error::Result;

pub struct SummariserExecutor {
    storage: Arc<StorageManager>,
    llm: Arc<dyn LlmService>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    batch_limit: u32,
}

impl SummariserExecutor {
    pub fn new(
        storage: Arc<StorageManager>,
        llm: Arc<dyn LlmService>,
        clock: Arc<dyn Clock>,
        freshness_window: Duration,
        batch_limit: u32,
    ) -> Self {
        Self {
            storage,
            llm,
            clock,
            freshness_window,
            batch_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
}

fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "Summarise the following document in 2-3 sentences and list up to 8 keywords.\n\
         Respond with JSON only: {{\"summary\": \"...\", \"keywords\": [\"...\"]}}\n\n\
         Title: {title}\n\n{content}"
    )
}

fn parse_reply(raw: &str) -> SummaryReply {
    serde_json::from_str(raw).unwrap_or_else(|_| SummaryReply {
        summary: raw.trim().to_string(),
        keywords: Vec::new(),
    })
}

#[async_trait]
impl JobExecutor for SummariserExecutor {
    async fn execute(&self, _job: &Job, cancel: CancelToken) -> Result<()> {
        let cutoff = self.clock.now() - self.freshness_window;
        let documents = self.storage.documents.list_needing_summary(cutoff, self.batch_limit)?;

        for doc in documents {
            if cancel.is_cancelled() {
                break;
            }

            let prompt = build_prompt(&doc.title, &doc.content_markdown);
            let reply = self
                .llm
                .chat(&[
                    ChatMessage::system("You are a terse technical summariser."),
                    ChatMessage::user(prompt),
                ])
                .await?;
            let parsed = parse_reply(&reply);

            let mut patch = Map::new();
            patch.insert("summary".to_string(), Value::String(parsed.summary));
            patch.insert(
                "keywords".to_string(),
                Value::Array(parsed.keywords.into_iter().map(Value::String).collect()),
            );
            patch.insert(
                "last_summarized".to_string(),
                Value::String(self.clock.now().to_rfc3339()),
            );

            self.storage.documents.merge_metadata(&doc.id, patch)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "summariser_tests.rs"]
mod tests;
