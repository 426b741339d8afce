//! Source configuration persistence.

use crate::error::{Result, StorageError};
use crate::pool::Pool;
use quaero_core::{AuthId, Clock, CrawlConfig, LinkFilters, SourceConfig, SourceId, SourceType};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;

pub struct SourceStore {
    pool: Pool,
    clock: Arc<dyn Clock>,
}

impl SourceStore {
    pub fn new(pool: Pool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn create(&self, source: SourceConfig) -> Result<SourceConfig> {
        source.validate()?;
        let conn = self.pool.get()?;
        let now = self.clock.now().to_rfc3339();
        conn.execute(
            "INSERT INTO sources (id, source_type, name, base_url, enabled, auth_id, crawl_config, filters, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                source.id.as_str(),
                source.source_type.as_str(),
                source.name,
                source.base_url,
                source.enabled,
                source.auth_id.as_ref().map(|a| a.as_str().to_string()),
                serde_json::to_string(&source.crawl_config)?,
                serde_json::to_string(&source.filters)?,
                now,
            ],
        )?;
        self.get(&source.id)
    }

    pub fn get(&self, id: &SourceId) -> Result<SourceConfig> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT id, source_type, name, base_url, enabled, auth_id, crawl_config, filters
             FROM sources WHERE id = ?1",
            params![id.as_str()],
            row_to_source,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound {
            entity: "source",
            id: id.as_str().to_string(),
        })
    }

    pub fn list(&self) -> Result<Vec<SourceConfig>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, source_type, name, base_url, enabled, auth_id, crawl_config, filters FROM sources",
        )?;
        let rows = stmt
            .query_map([], row_to_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn update(&self, source: SourceConfig) -> Result<SourceConfig> {
        source.validate()?;
        let conn = self.pool.get()?;
        let now = self.clock.now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE sources SET source_type = ?2, name = ?3, base_url = ?4, enabled = ?5,
                auth_id = ?6, crawl_config = ?7, filters = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                source.id.as_str(),
                source.source_type.as_str(),
                source.name,
                source.base_url,
                source.enabled,
                source.auth_id.as_ref().map(|a| a.as_str().to_string()),
                serde_json::to_string(&source.crawl_config)?,
                serde_json::to_string(&source.filters)?,
                now,
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "source",
                id: source.id.as_str().to_string(),
            });
        }
        self.get(&source.id)
    }

    pub fn delete(&self, id: &SourceId) -> Result<()> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM sources WHERE id = ?1", params![id.as_str()])?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "source",
                id: id.as_str().to_string(),
            });
        }
        Ok(())
    }
}

fn row_to_source(row: &Row) -> rusqlite::Result<SourceConfig> {
    let source_type: String = row.get(1)?;
    let auth_id: Option<String> = row.get(5)?;
    let crawl_config: String = row.get(6)?;
    let filters: String = row.get(7)?;

    Ok(SourceConfig {
        id: SourceId::new(row.get::<_, String>(0)?),
        source_type: SourceType::from_str(&source_type).unwrap_or(SourceType::Generic),
        name: row.get(2)?,
        base_url: row.get(3)?,
        enabled: row.get(4)?,
        auth_id: auth_id.map(AuthId::new),
        crawl_config: serde_json::from_str::<CrawlConfig>(&crawl_config).unwrap_or_default(),
        filters: serde_json::from_str::<LinkFilters>(&filters).unwrap_or_default(),
    })
}

#[cfg(test)]
#[path = "source_store_tests.rs"]
mod tests;
