//! Job instance persistence and the sticky-terminal status invariant,
//! enforced here via a conditional `UPDATE` rather than trusted to
//! callers.

use crate::error::{Result, StorageError};
use crate::pool::Pool;
use chrono::{DateTime, Utc};
use quaero_core::{
    Clock, IdGen, InvariantError, Job, JobDefinitionId, JobId, JobKind, JobMetadata, JobProgress,
    JobSpec, JobStatus, StepStats,
};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;

pub struct JobStore {
    pool: Pool,
    clock: Arc<dyn Clock>,
}

impl JobStore {
    pub fn new(pool: Pool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Create a job in `pending` status. The caller supplies an id
    /// generator rather than this store hardcoding UUIDs, so tests can
    /// use deterministic ids.
    pub fn create_job(&self, spec: JobSpec, id_gen: &impl IdGen) -> Result<Job> {
        let conn = self.pool.get()?;
        let now = self.clock.now();
        let job = Job {
            id: JobId::generate(id_gen),
            definition_id: spec.definition_id,
            parent_id: spec.parent_id,
            kind: spec.kind,
            status: JobStatus::Pending,
            progress: JobProgress::default(),
            metadata: spec.metadata,
            error: None,
            heartbeat_at: now,
            started_at: None,
            finished_at: None,
            created_at: now,
        };

        conn.execute(
            "INSERT INTO jobs (id, definition_id, parent_id, kind, status, progress_current, progress_total, progress_text, metadata, error, heartbeat_at, started_at, finished_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                job.id.as_str(),
                job.definition_id.as_ref().map(|d| d.as_str().to_string()),
                job.parent_id.as_ref().map(|p| p.as_str().to_string()),
                job.kind.as_str(),
                job.status.as_str(),
                job.progress.current as i64,
                job.progress.total as i64,
                job.progress.progress_text,
                serde_json::to_string(&job.metadata)?,
                job.error,
                job.heartbeat_at.to_rfc3339(),
                job.started_at.map(|t| t.to_rfc3339()),
                job.finished_at.map(|t| t.to_rfc3339()),
                job.created_at.to_rfc3339(),
            ],
        )?;
        Ok(job)
    }

    pub fn get(&self, id: &JobId) -> Result<Job> {
        let conn = self.pool.get()?;
        conn.query_row(&format!("{SELECT_JOB} WHERE id = ?1"), params![id.as_str()], row_to_job)
            .optional()?
            .ok_or_else(|| StorageError::NotFound {
                entity: "job",
                id: id.as_str().to_string(),
            })
    }

    /// Transition a job's status. Rejected (without mutating anything)
    /// when the current status is already terminal — the guard is a
    /// conditional `UPDATE ... WHERE status NOT IN (...)` so the check
    /// and the write are one atomic statement, immune to a race between
    /// two callers updating concurrently.
    pub fn update_job_status(
        &self,
        id: &JobId,
        to: JobStatus,
        error: Option<String>,
    ) -> Result<Job> {
        let conn = self.pool.get()?;
        let now = self.clock.now();

        let finished_at = if to.is_terminal() {
            Some(now.to_rfc3339())
        } else {
            None
        };
        let started_at = if matches!(to, JobStatus::Running) {
            Some(now.to_rfc3339())
        } else {
            None
        };

        let affected = conn.execute(
            "UPDATE jobs SET status = ?2, error = ?3,
                 finished_at = COALESCE(?4, finished_at),
                 started_at = COALESCE(started_at, ?5)
             WHERE id = ?1 AND status NOT IN ('completed', 'failed', 'cancelled')",
            params![id.as_str(), to.as_str(), error, finished_at, started_at],
        )?;

        if affected == 0 {
            let current = self.get(id)?;
            return Err(InvariantError::TerminalJobReTransition {
                id: id.as_str().to_string(),
                status: current.status.to_string(),
            }
            .into());
        }

        self.get(id)
    }

    /// Single-column, monotonic write: a heartbeat older than the one
    /// already stored is silently ignored rather than erroring, since a
    /// delayed retry racing a newer heartbeat is expected, not
    /// exceptional.
    pub fn update_job_heartbeat(&self, id: &JobId) -> Result<()> {
        let conn = self.pool.get()?;
        let now = self.clock.now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE jobs SET heartbeat_at = ?2 WHERE id = ?1 AND heartbeat_at < ?2",
            params![id.as_str(), now],
        )?;
        if affected == 0 && self.get(id).is_err() {
            return Err(StorageError::NotFound {
                entity: "job",
                id: id.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Overwrite a job's `metadata` JSON blob wholesale. Used by the
    /// parent-aggregator executor to write a freshly recomputed
    /// `step_stats`/`progress_text` snapshot; never used to change
    /// `status`, which only ever moves through [`update_job_status`].
    ///
    /// [`update_job_status`]: Self::update_job_status
    pub fn update_job_metadata(&self, id: &JobId, metadata: &JobMetadata) -> Result<()> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "UPDATE jobs SET metadata = ?2 WHERE id = ?1",
            params![id.as_str(), serde_json::to_string(metadata)?],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "job",
                id: id.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("{SELECT_JOB} WHERE status = ?1"))?;
        let rows = stmt
            .query_map(params![status.as_str()], row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Running jobs whose heartbeat hasn't advanced within the given
    /// threshold — candidates for the scheduler's stale-detection sweep.
    pub fn get_stale_jobs(&self, threshold_minutes: i64) -> Result<Vec<Job>> {
        let conn = self.pool.get()?;
        let cutoff = (self.clock.now() - chrono::Duration::minutes(threshold_minutes)).to_rfc3339();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_JOB} WHERE status = 'running' AND heartbeat_at < ?1"
        ))?;
        let rows = stmt
            .query_map(params![cutoff], row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most recently created jobs first, optionally filtered to one
    /// status. Backs the jobs API's list endpoint.
    pub fn list_paginated(&self, status: Option<JobStatus>, limit: u32, offset: u32) -> Result<Vec<Job>> {
        let conn = self.pool.get()?;
        let rows = match status {
            Some(status) => {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_JOB} WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"))?;
                stmt.query_map(params![status.as_str(), limit, offset], row_to_job)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{SELECT_JOB} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"))?;
                stmt.query_map(params![limit, offset], row_to_job)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    /// Tally of a parent job's direct children by status.
    pub fn get_child_job_stats(&self, parent_id: &JobId) -> Result<StepStats> {
        let conn = self.pool.get()?;
        let mut stats = StepStats::default();
        let mut stmt =
            conn.prepare("SELECT status, count(*) FROM jobs WHERE parent_id = ?1 GROUP BY status")?;
        let rows = stmt.query_map(params![parent_id.as_str()], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;
        for row in rows {
            let (status, count) = row?;
            let count = count as u32;
            match JobStatus::from_str(&status).ok() {
                Some(JobStatus::Pending) => stats.pending += count,
                Some(JobStatus::Running) | Some(JobStatus::Stale) => stats.running += count,
                Some(JobStatus::Completed) => stats.completed += count,
                Some(JobStatus::Failed) => stats.failed += count,
                Some(JobStatus::Cancelled) => stats.cancelled += count,
                None => {}
            }
        }
        Ok(stats)
    }
}

const SELECT_JOB: &str = "SELECT id, definition_id, parent_id, kind, status, progress_current, progress_total, progress_text, metadata, error, heartbeat_at, started_at, finished_at, created_at FROM jobs";

fn row_to_job(row: &Row) -> rusqlite::Result<Job> {
    let definition_id: Option<String> = row.get(1)?;
    let parent_id: Option<String> = row.get(2)?;
    let kind: String = row.get(3)?;
    let status: String = row.get(4)?;
    let progress_current: i64 = row.get(5)?;
    let progress_total: i64 = row.get(6)?;
    let progress_text: String = row.get(7)?;
    let metadata: String = row.get(8)?;
    let heartbeat_at: String = row.get(10)?;
    let started_at: Option<String> = row.get(11)?;
    let finished_at: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;

    Ok(Job {
        id: JobId::new(row.get::<_, String>(0)?),
        definition_id: definition_id.map(JobDefinitionId::new),
        parent_id: parent_id.map(JobId::new),
        kind: parse_kind(&kind),
        status: JobStatus::from_str(&status).unwrap_or(JobStatus::Failed),
        progress: JobProgress {
            current: progress_current as u64,
            total: progress_total as u64,
            progress_text,
        },
        metadata: serde_json::from_str::<JobMetadata>(&metadata).unwrap_or_default(),
        error: row.get(9)?,
        heartbeat_at: parse_rfc3339(&heartbeat_at),
        started_at: started_at.as_deref().map(parse_rfc3339),
        finished_at: finished_at.as_deref().map(parse_rfc3339),
        created_at: parse_rfc3339(&created_at),
    })
}

fn parse_kind(s: &str) -> JobKind {
    JobKind::from_str(s).unwrap_or(JobKind::Maintenance)
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
