//! Job identifier, status state machine, and progress/metadata envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvariantError;
use crate::source::SourceId;

crate::define_id! {
    /// Unique identifier for a runtime job instance.
    pub struct JobId;
}

crate::define_id! {
    /// Unique identifier for a registered, nameable [`JobDefinition`].
    pub struct JobDefinitionId;
}

/// What kind of work a job (or its definition) performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Crawler,
    Maintenance,
    Summariser,
    Aggregator,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Crawler => "crawler",
            JobKind::Maintenance => "maintenance",
            JobKind::Summariser => "summariser",
            JobKind::Aggregator => "aggregator",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = InvariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crawler" => Ok(JobKind::Crawler),
            "maintenance" => Ok(JobKind::Maintenance),
            "summariser" => Ok(JobKind::Summariser),
            "aggregator" => Ok(JobKind::Aggregator),
            other => Err(InvariantError::UnknownJobType(other.to_string())),
        }
    }
}

/// Whether a composite job definition stops at the first child failure
/// or keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTolerance {
    Strict,
    Continue,
}

impl Default for ErrorTolerance {
    fn default() -> Self {
        ErrorTolerance::Strict
    }
}

/// Runtime status of a [`Job`]. `Completed`, `Failed`, and `Cancelled`
/// are terminal: once reached, the status never changes again (the
/// sticky-terminal invariant, enforced both here and, redundantly, at
/// the storage layer via a conditional `UPDATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Stale,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Stale => "stale",
        }
    }

    /// Terminal states are sticky: a job that reaches one of these never
    /// transitions again. `Stale` is deliberately *not* terminal — it is
    /// a transient marker the scheduler applies before failing the job
    /// outright.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Validate a proposed transition against the sticky-terminal
    /// invariant. Re-entering the same terminal state is also rejected —
    /// terminal means terminal.
    pub fn validate_transition(&self, to: JobStatus) -> Result<(), InvariantError> {
        if self.is_terminal() {
            return Err(InvariantError::TerminalJobReTransition {
                id: String::new(),
                status: self.to_string(),
            });
        }
        let _ = to;
        Ok(())
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            "stale" => Ok(JobStatus::Stale),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

/// Current/total pair plus a free-form human-readable description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub current: u64,
    pub total: u64,
    #[serde(default)]
    pub progress_text: String,
}

/// Tally of a parent job's direct children by status, used both for
/// `GetChildJobStats` and for the `step_stats` entry in a parent's
/// metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub pending: u32,
    pub running: u32,
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
}

impl StepStats {
    pub fn total(&self) -> u32 {
        self.pending + self.running + self.completed + self.failed + self.cancelled
    }

    /// "X pending, Y running, Z completed, W failed" — cancelled counts
    /// are folded into the total but not rendered in the text.
    pub fn progress_text(&self) -> String {
        format!(
            "{} pending, {} running, {} completed, {} failed",
            self.pending, self.running, self.completed, self.failed
        )
    }

    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
            JobStatus::Stale => self.running += 1,
        }
    }
}

/// Open key/value metadata with a typed envelope for the fields the core
/// reads directly, plus an opaque bag for pass-through data (crawler
/// bookkeeping, source-specific hints). Serializes as a single flat JSON
/// object so existing rows and UI clients see one `metadata` blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_stats: Option<StepStats>,
    #[serde(default)]
    pub document_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_config_snapshot: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A runtime job instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub definition_id: Option<JobDefinitionId>,
    #[serde(default)]
    pub parent_id: Option<JobId>,
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub metadata: JobMetadata,
    #[serde(default)]
    pub error: Option<String>,
    pub heartbeat_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Input for [`Job`] creation. Not persisted directly — the job manager
/// turns this into a `pending` `Job` row.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub definition_id: Option<JobDefinitionId>,
    pub parent_id: Option<JobId>,
    pub kind: JobKind,
    pub metadata: JobMetadata,
}

/// A registered, nameable unit of work. Immutable during an active run;
/// edited only via the definitions API or TOML seeding at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: JobDefinitionId,
    pub name: String,
    pub kind: JobKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sources: Vec<SourceId>,
    #[serde(default)]
    pub steps: Vec<String>,
    /// Cron-like schedule expression. `None` means on-demand only.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub pre_jobs: Vec<JobDefinitionId>,
    #[serde(default)]
    pub post_jobs: Vec<JobDefinitionId>,
    #[serde(default)]
    pub error_tolerance: ErrorTolerance,
    /// Set when registration hit a configuration error (unparseable
    /// cron, unknown job type): the definition is still stored, but
    /// disabled, with the reason recorded here for the UI.
    #[serde(default)]
    pub config_error: Option<String>,
}

fn default_timeout_secs() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}

pub const MIN_SCHEDULE_PERIOD_SECS: u64 = 300;

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
