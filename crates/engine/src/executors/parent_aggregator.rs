//! Subscribes to the bus and keeps a parent job's `step_stats` current
//! whenever one of its children changes status. Not a [`super::JobExecutor`] —
//! it never runs as a dispatched job, only reacts to events published by
//! one. A multi-source crawl's `aggregator`-kind parent never gets an
//! executor of its own; this subscriber is what carries it to a
//! terminal state once every child has reached one.

use quaero_core::{Event, EventSubscriber, JobStatus};
use std::sync::Arc;

use crate::job_manager::JobManager;

pub struct ParentAggregator {
    job_manager: Arc<JobManager>,
}

impl ParentAggregator {
    pub fn new(job_manager: Arc<JobManager>) -> Self {
        Self { job_manager }
    }
}

impl EventSubscriber for ParentAggregator {
    fn on_event(&self, event: &Event) {
        let Event::JobStatusChange { parent_id: Some(parent_id), .. } = event else {
            return;
        };

        let stats = match self.job_manager.get_child_job_stats(parent_id) {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(parent_id = %parent_id, error = %err, "failed to load child job stats");
                return;
            }
        };

        if let Err(err) = self.job_manager.refresh_parent_step_stats(parent_id) {
            tracing::warn!(parent_id = %parent_id, error = %err, "failed to refresh parent step stats");
            return;
        }

        if stats.pending > 0 || stats.running > 0 {
            return;
        }

        let parent = match self.job_manager.storage().jobs.get(parent_id) {
            Ok(parent) => parent,
            Err(err) => {
                tracing::warn!(parent_id = %parent_id, error = %err, "failed to reload parent job");
                return;
            }
        };

        if parent.is_terminal() {
            return;
        }

        let to = if stats.failed > 0 {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };

        if let Err(err) = self.job_manager.update_job_status(parent_id, to, None) {
            tracing::warn!(parent_id = %parent_id, error = %err, "failed to close out aggregator job");
        }
    }
}

#[cfg(test)]
#[path = "parent_aggregator_tests.rs"]
mod tests;
