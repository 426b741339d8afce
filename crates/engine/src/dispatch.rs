//! Picks the right executor by job kind, honours the job's timeout as
//! a context deadline, and writes the terminal status. Executors never
//! touch `status` themselves — this is the one place that's allowed
//! to, besides the scheduler's own stale/orphan sweeps.

use quaero_core::{CancelToken, Job, JobId, JobKind, JobStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::executors::JobExecutor;
use crate::job_manager::JobManager;

enum Outcome {
    Finished(Result<()>),
    TimedOut,
}

pub struct Dispatcher {
    job_manager: Arc<JobManager>,
    crawler: Arc<dyn JobExecutor>,
    maintenance: Arc<dyn JobExecutor>,
    summariser: Arc<dyn JobExecutor>,
    active: parking_lot::Mutex<HashMap<JobId, CancelToken>>,
}

impl Dispatcher {
    pub fn new(
        job_manager: Arc<JobManager>,
        crawler: Arc<dyn JobExecutor>,
        maintenance: Arc<dyn JobExecutor>,
        summariser: Arc<dyn JobExecutor>,
    ) -> Self {
        Self {
            job_manager,
            crawler,
            maintenance,
            summariser,
            active: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn executor_for(&self, kind: JobKind) -> Option<Arc<dyn JobExecutor>> {
        match kind {
            JobKind::Crawler => Some(Arc::clone(&self.crawler)),
            JobKind::Maintenance => Some(Arc::clone(&self.maintenance)),
            JobKind::Summariser => Some(Arc::clone(&self.summariser)),
            JobKind::Aggregator => None,
        }
    }

    /// Run one job to a terminal status. `aggregator`-kind jobs have no
    /// executor of their own — they're marked `running` and left for
    /// [`crate::executors::ParentAggregator`] to close out once every
    /// child has reached a terminal state.
    pub async fn run_to_completion(&self, job: Job, timeout: Duration) -> Result<()> {
        self.job_manager.update_job_status(&job.id, JobStatus::Running, None)?;

        if job.kind == JobKind::Aggregator {
            return Ok(());
        }

        let executor = self
            .executor_for(job.kind)
            .ok_or_else(|| EngineError::NoExecutor(job.kind.to_string()))?;

        let cancel = CancelToken::new();
        self.active.lock().insert(job.id.clone(), cancel.clone());

        let outcome = tokio::select! {
            result = executor.execute(&job, cancel.clone()) => Outcome::Finished(result),
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
        };

        self.active.lock().remove(&job.id);

        let (status, error) = match outcome {
            Outcome::Finished(Ok(())) => (JobStatus::Completed, None),
            Outcome::Finished(Err(err)) if cancel.is_cancelled() => (JobStatus::Cancelled, Some(err.to_string())),
            Outcome::Finished(Err(err)) => (JobStatus::Failed, Some(err.to_string())),
            Outcome::TimedOut => {
                cancel.cancel();
                (JobStatus::Failed, Some(format!("job exceeded timeout of {timeout:?}")))
            }
        };

        self.job_manager.update_job_status(&job.id, status, error)?;
        Ok(())
    }

    /// Request cancellation of an in-flight job. A no-op if the job
    /// isn't currently tracked (already finished, or never dispatched).
    pub fn cancel(&self, job_id: &JobId) {
        if let Some(cancel) = self.active.lock().get(job_id) {
            cancel.cancel();
        }
    }

    pub fn cancel_all(&self) {
        for cancel in self.active.lock().values() {
            cancel.cancel();
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
