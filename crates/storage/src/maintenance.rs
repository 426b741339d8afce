//! Off-peak housekeeping: `VACUUM`, FTS5 shadow-table rebuild, and
//! pruning of old terminal jobs. Run by the maintenance executor, never
//! on the hot path of a crawl.

use crate::error::Result;
use crate::pool::Pool;
use chrono::{DateTime, Utc};
use rusqlite::params;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub jobs_pruned: u64,
    pub fts_rebuilt: bool,
    pub vacuumed: bool,
}

pub struct MaintenanceStore {
    pool: Pool,
}

impl MaintenanceStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Delete terminal jobs that finished before `cutoff` and have no
    /// children of their own. Per-URL child jobs are leaves, so one pass
    /// clears them; a parent whose children haven't aged out yet is left
    /// for the next run rather than forced out of order (the `jobs`
    /// table's `parent_id` foreign key would reject it anyway).
    pub fn prune_terminal_jobs(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "DELETE FROM jobs
             WHERE status IN ('completed', 'failed', 'cancelled')
               AND finished_at IS NOT NULL
               AND finished_at <= ?1
               AND id NOT IN (SELECT DISTINCT parent_id FROM jobs WHERE parent_id IS NOT NULL)",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(affected as u64)
    }

    /// Rebuild the FTS5 shadow index from the `documents` table contents.
    pub fn rebuild_fts_index(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("INSERT INTO documents_fts(documents_fts) VALUES ('rebuild')", [])?;
        Ok(())
    }

    /// Reclaim free pages. Runs on its own connection from the pool;
    /// SQLite requires `VACUUM` to see no other open transaction on that
    /// connection, which holds here since every other store commits each
    /// statement immediately.
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch("VACUUM;")?;
        Ok(())
    }

    /// Run the full sweep: prune, rebuild the FTS index, then vacuum.
    pub fn run(&self, prune_cutoff: DateTime<Utc>) -> Result<MaintenanceReport> {
        let jobs_pruned = self.prune_terminal_jobs(prune_cutoff)?;
        self.rebuild_fts_index()?;
        self.vacuum()?;
        Ok(MaintenanceReport {
            jobs_pruned,
            fts_rebuilt: true,
            vacuumed: true,
        })
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
