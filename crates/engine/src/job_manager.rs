//! Single source of truth for job lifecycle. Executors and storage
//! writers never mutate `status` directly — every transition goes
//! through here so the bus sees exactly one `job_status_change` (and,
//! on terminal states, one `job_completed`) per transition.

use quaero_core::{Event, IdGen, Job, JobId, JobSpec, JobStatus, LogLevel, StepStats};
use quaero_storage::StorageManager;
use std::sync::Arc;

use crate::error::Result;

pub struct JobManager {
    storage: Arc<StorageManager>,
    bus: quaero_core::EventBus,
    id_gen: Arc<dyn IdGen>,
}

impl JobManager {
    pub fn new(storage: Arc<StorageManager>, bus: quaero_core::EventBus, id_gen: Arc<dyn IdGen>) -> Self {
        Self { storage, bus, id_gen }
    }

    pub fn create_job(&self, spec: JobSpec) -> Result<Job> {
        let kind = spec.kind;
        let parent_id = spec.parent_id.clone();
        let definition_id = spec.definition_id.clone();
        let job = self.storage.jobs.create_job(spec, self.id_gen.as_ref())?;

        self.bus.publish(Event::JobCreated {
            id: job.id.clone(),
            kind,
            definition_id,
            parent_id,
        });
        self.bus.log(
            LogLevel::Info,
            "job_manager",
            format!("job {} created ({kind})", job.id),
        );
        Ok(job)
    }

    /// Transition a job's status, publishing `job_status_change` and
    /// (on a terminal destination) `job_completed`. Rejected by the
    /// store when the current status is already terminal.
    pub fn update_job_status(&self, id: &JobId, to: JobStatus, error: Option<String>) -> Result<Job> {
        let before = self.storage.jobs.get(id)?;
        let from = before.status;

        let job = self.storage.jobs.update_job_status(id, to, error.clone())?;

        self.bus.publish(Event::JobStatusChange {
            id: job.id.clone(),
            parent_id: job.parent_id.clone(),
            from,
            to,
            error: error.clone(),
        });

        if to.is_terminal() {
            self.bus.publish(Event::JobCompleted {
                id: job.id.clone(),
                parent_id: job.parent_id.clone(),
                status: to,
                document_count: job.metadata.document_count,
            });
        }

        if let Some(err) = &error {
            self.bus.log(LogLevel::Warn, "job_manager", format!("job {id} -> {to}: {err}"));
        } else {
            self.bus.log(LogLevel::Info, "job_manager", format!("job {id} -> {to}"));
        }

        Ok(job)
    }

    pub fn update_job_heartbeat(&self, id: &JobId) -> Result<()> {
        self.storage.jobs.update_job_heartbeat(id)?;
        Ok(())
    }

    pub fn increment_document_count(&self, id: &JobId) -> Result<()> {
        self.storage.documents.increment_document_count(id.as_str())?;
        Ok(())
    }

    pub fn get_child_job_stats(&self, parent_id: &JobId) -> Result<StepStats> {
        Ok(self.storage.jobs.get_child_job_stats(parent_id)?)
    }

    /// Recompute a parent job's `metadata.step_stats`/`progress_text`
    /// from its children's current status distribution and publish
    /// `parent_job_progress`. Driven by the parent-aggregator executor
    /// in response to `job_status_change` events, so this is
    /// eventually-consistent by design — a late-arriving event just
    /// triggers one more recomputation.
    pub fn refresh_parent_step_stats(&self, parent_id: &JobId) -> Result<()> {
        let stats = self.get_child_job_stats(parent_id)?;
        let mut parent = self.storage.jobs.get(parent_id)?;
        parent.metadata.step_stats = Some(stats);
        let progress_text = stats.progress_text();

        self.storage.jobs.update_job_metadata(parent_id, &parent.metadata)?;

        self.bus.publish(Event::ParentJobProgress {
            parent_id: parent_id.clone(),
            stats,
            progress_text,
        });

        Ok(())
    }

    pub fn bus(&self) -> &quaero_core::EventBus {
        &self.bus
    }

    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
