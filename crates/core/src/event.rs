//! Event kinds published on the event bus. Serializes as
//! `{"type": "event:name", ...fields}`; unknown tags fail to deserialize
//! rather than silently dropping (subscribers are expected to know the
//! full set published by this binary).

use crate::document::{DetailLevel, DocumentId, SourceType};
use crate::job::{JobDefinitionId, JobId, JobKind, JobStatus, StepStats};
use serde::{Deserialize, Serialize};

/// Severity for the `log` event, mirroring `tracing`'s own levels so the
/// WebSocket gateway can let UI clients filter by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "job_created")]
    JobCreated {
        id: JobId,
        kind: JobKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition_id: Option<JobDefinitionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<JobId>,
    },

    #[serde(rename = "job_status_change")]
    JobStatusChange {
        id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<JobId>,
        from: JobStatus,
        to: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "job_progress")]
    JobProgress {
        id: JobId,
        visited_count: u64,
        queued_count: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress_text: Option<String>,
    },

    #[serde(rename = "job_completed")]
    JobCompleted {
        id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<JobId>,
        status: JobStatus,
        document_count: u64,
    },

    #[serde(rename = "parent_job_progress")]
    ParentJobProgress {
        parent_id: JobId,
        stats: StepStats,
        progress_text: String,
    },

    #[serde(rename = "document_saved")]
    DocumentSaved {
        id: DocumentId,
        source_type: SourceType,
        source_id: String,
        detail_level: DetailLevel,
    },

    #[serde(rename = "document_updated")]
    DocumentUpdated {
        id: DocumentId,
        source_type: SourceType,
        source_id: String,
        detail_level: DetailLevel,
    },

    #[serde(rename = "collection_triggered")]
    CollectionTriggered {
        definition_id: JobDefinitionId,
        job_id: JobId,
    },

    #[serde(rename = "log")]
    Log {
        level: LogLevel,
        target: String,
        message: String,
    },
}

impl Event {
    /// Event kind string, used for WebSocket client subscription
    /// filtering (clients subscribe to a selectable set of kinds).
    pub fn kind(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job_created",
            Event::JobStatusChange { .. } => "job_status_change",
            Event::JobProgress { .. } => "job_progress",
            Event::JobCompleted { .. } => "job_completed",
            Event::ParentJobProgress { .. } => "parent_job_progress",
            Event::DocumentSaved { .. } => "document_saved",
            Event::DocumentUpdated { .. } => "document_updated",
            Event::CollectionTriggered { .. } => "collection_triggered",
            Event::Log { .. } => "log",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
