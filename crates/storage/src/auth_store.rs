//! Keyed credential blobs, written by the browser-extension gateway and
//! resolved by reference at crawl dispatch time.

use crate::error::{Result, StorageError};
use crate::pool::Pool;
use quaero_core::{AuthId, AuthSnapshot, Clock};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

pub struct AuthStore {
    pool: Pool,
    clock: Arc<dyn Clock>,
}

impl AuthStore {
    pub fn new(pool: Pool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Store (or fully replace) the snapshot for an auth id.
    pub fn save(&self, mut snapshot: AuthSnapshot) -> Result<AuthSnapshot> {
        snapshot.updated_at = self.clock.now();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO auth_snapshots (id, cookies, tokens, base_url, user_agent, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 cookies = excluded.cookies,
                 tokens = excluded.tokens,
                 base_url = excluded.base_url,
                 user_agent = excluded.user_agent,
                 updated_at = excluded.updated_at",
            params![
                snapshot.id.as_str(),
                serde_json::to_string(&snapshot.cookies)?,
                serde_json::to_string(&snapshot.tokens)?,
                snapshot.base_url,
                snapshot.user_agent,
                snapshot.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(snapshot)
    }

    /// Resolve the latest snapshot for an auth id, or not-found. Callers
    /// copy the result into a job's in-memory context rather than
    /// holding a live reference, so a later credential rotation never
    /// mutates an in-flight crawl.
    pub fn resolve(&self, auth_id: &AuthId) -> Result<AuthSnapshot> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT id, cookies, tokens, base_url, user_agent, updated_at FROM auth_snapshots WHERE id = ?1",
            params![auth_id.as_str()],
            row_to_snapshot,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound {
            entity: "auth_snapshot",
            id: auth_id.as_str().to_string(),
        })
    }

    pub fn list(&self) -> Result<Vec<AuthSnapshot>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, cookies, tokens, base_url, user_agent, updated_at FROM auth_snapshots ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_snapshot)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete(&self, auth_id: &AuthId) -> Result<()> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM auth_snapshots WHERE id = ?1", params![auth_id.as_str()])?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "auth_snapshot",
                id: auth_id.as_str().to_string(),
            });
        }
        Ok(())
    }
}

fn row_to_snapshot(row: &Row) -> rusqlite::Result<AuthSnapshot> {
    let cookies: String = row.get(1)?;
    let tokens: String = row.get(2)?;
    let updated_at: String = row.get(5)?;

    Ok(AuthSnapshot {
        id: AuthId::new(row.get::<_, String>(0)?),
        cookies: serde_json::from_str(&cookies).unwrap_or_default(),
        tokens: serde_json::from_str(&tokens).unwrap_or_default(),
        base_url: row.get(3)?,
        user_agent: row.get(4)?,
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
#[path = "auth_store_tests.rs"]
mod tests;
