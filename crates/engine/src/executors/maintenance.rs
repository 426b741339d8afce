//! Off-peak database housekeeping, dispatched as an ordinary job so it
//! shows up in the same job list/history as crawls and summaries.

use async_trait::async_trait;
use chrono::Duration;
use quaero_core::{CancelToken, Clock, Job};
use quaero_storage::StorageManager;
use std::sync::Arc;

use super::JobExecutor;
use crate::error::Result;

pub struct MaintenanceExecutor {
    storage: Arc<StorageManager>,
    clock: Arc<dyn Clock>,
    retention_days: i64,
}

impl MaintenanceExecutor {
    pub fn new(storage: Arc<StorageManager>, clock: Arc<dyn Clock>, retention_days: i64) -> Self {
        Self {
            storage,
            clock,
            retention_days,
        }
    }
}

#[async_trait]
impl JobExecutor for MaintenanceExecutor {
    async fn execute(&self, _job: &Job, _cancel: CancelToken) -> Result<()> {
        let cutoff = self.clock.now() - Duration::days(self.retention_days);
        let report = self.storage.maintenance.run(cutoff)?;
        tracing::info!(
            jobs_pruned = report.jobs_pruned,
            fts_rebuilt = report.fts_rebuilt,
            vacuumed = report.vacuumed,
            "maintenance run complete"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
