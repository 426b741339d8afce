//! Registered job definitions: the named, schedulable units of work
//! seeded from config at startup and editable through the definitions
//! API thereafter.

use crate::error::{Result, StorageError};
use crate::pool::Pool;
use quaero_core::{
    ErrorTolerance, InvariantError, JobDefinition, JobDefinitionId, JobKind, SourceId,
};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashSet;
use std::str::FromStr;

pub struct JobDefinitionStore {
    pool: Pool,
}

impl JobDefinitionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn create(&self, def: JobDefinition) -> Result<JobDefinition> {
        let conn = self.pool.get()?;
        let now = chrono::Utc::now().to_rfc3339();
        let result = conn.execute(
            "INSERT INTO job_definitions (id, name, kind, description, sources, steps, schedule, timeout_secs, enabled, auto_start, config, pre_jobs, post_jobs, error_tolerance, config_error, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                def.id.as_str(),
                def.name,
                def.kind.as_str(),
                def.description,
                serde_json::to_string(&def.sources)?,
                serde_json::to_string(&def.steps)?,
                def.schedule,
                def.timeout_secs as i64,
                def.enabled,
                def.auto_start,
                serde_json::to_string(&def.config)?,
                serde_json::to_string(&def.pre_jobs)?,
                serde_json::to_string(&def.post_jobs)?,
                error_tolerance_str(def.error_tolerance),
                def.config_error,
                now,
            ],
        );
        if let Err(rusqlite::Error::SqliteFailure(e, _)) = &result {
            if e.code == rusqlite::ErrorCode::ConstraintViolation {
                return Err(InvariantError::DuplicateDefinitionName { name: def.name }.into());
            }
        }
        result?;
        self.get(&def.id)
    }

    pub fn get(&self, id: &JobDefinitionId) -> Result<JobDefinition> {
        let conn = self.pool.get()?;
        conn.query_row(&format!("{SELECT_DEF} WHERE id = ?1"), params![id.as_str()], row_to_def)
            .optional()?
            .ok_or_else(|| StorageError::NotFound {
                entity: "job_definition",
                id: id.as_str().to_string(),
            })
    }

    pub fn list(&self) -> Result<Vec<JobDefinition>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(SELECT_DEF)?;
        let rows = stmt
            .query_map([], row_to_def)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Names already registered — used by the startup seeding pass to
    /// decide which TOML defaults still need to be created.
    pub fn existing_names(&self) -> Result<HashSet<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT name FROM job_definitions")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(rows)
    }

    pub fn update(&self, def: JobDefinition) -> Result<JobDefinition> {
        let conn = self.pool.get()?;
        let now = chrono::Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE job_definitions SET name = ?2, kind = ?3, description = ?4, sources = ?5, steps = ?6,
                 schedule = ?7, timeout_secs = ?8, enabled = ?9, auto_start = ?10, config = ?11,
                 pre_jobs = ?12, post_jobs = ?13, error_tolerance = ?14, config_error = ?15, updated_at = ?16
             WHERE id = ?1",
            params![
                def.id.as_str(),
                def.name,
                def.kind.as_str(),
                def.description,
                serde_json::to_string(&def.sources)?,
                serde_json::to_string(&def.steps)?,
                def.schedule,
                def.timeout_secs as i64,
                def.enabled,
                def.auto_start,
                serde_json::to_string(&def.config)?,
                serde_json::to_string(&def.pre_jobs)?,
                serde_json::to_string(&def.post_jobs)?,
                error_tolerance_str(def.error_tolerance),
                def.config_error,
                now,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "job_definition",
                id: def.id.as_str().to_string(),
            });
        }
        self.get(&def.id)
    }

    pub fn delete(&self, id: &JobDefinitionId) -> Result<()> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM job_definitions WHERE id = ?1", params![id.as_str()])?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "job_definition",
                id: id.as_str().to_string(),
            });
        }
        Ok(())
    }
}

const SELECT_DEF: &str = "SELECT id, name, kind, description, sources, steps, schedule, timeout_secs, enabled, auto_start, config, pre_jobs, post_jobs, error_tolerance, config_error FROM job_definitions";

fn error_tolerance_str(t: ErrorTolerance) -> &'static str {
    match t {
        ErrorTolerance::Strict => "strict",
        ErrorTolerance::Continue => "continue",
    }
}

fn row_to_def(row: &Row) -> rusqlite::Result<JobDefinition> {
    let kind: String = row.get(2)?;
    let sources: String = row.get(4)?;
    let steps: String = row.get(5)?;
    let config: String = row.get(10)?;
    let pre_jobs: String = row.get(11)?;
    let post_jobs: String = row.get(12)?;
    let error_tolerance: String = row.get(13)?;

    Ok(JobDefinition {
        id: JobDefinitionId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        kind: JobKind::from_str(&kind).unwrap_or(JobKind::Crawler),
        description: row.get(3)?,
        sources: serde_json::from_str::<Vec<SourceId>>(&sources).unwrap_or_default(),
        steps: serde_json::from_str(&steps).unwrap_or_default(),
        schedule: row.get(6)?,
        timeout_secs: row.get::<_, i64>(7)? as u64,
        enabled: row.get(8)?,
        auto_start: row.get(9)?,
        config: serde_json::from_str(&config).unwrap_or_default(),
        pre_jobs: serde_json::from_str(&pre_jobs).unwrap_or_default(),
        post_jobs: serde_json::from_str(&post_jobs).unwrap_or_default(),
        error_tolerance: if error_tolerance == "continue" {
            ErrorTolerance::Continue
        } else {
            ErrorTolerance::Strict
        },
        config_error: row.get(14)?,
    })
}

#[cfg(test)]
#[path = "job_definition_store_tests.rs"]
mod tests;
