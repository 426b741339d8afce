//! Connection pool construction. A single writer discipline is enforced
//! by the caller (the job/document stores serialize writes through one
//! pooled connection at a time via SQLite's own locking) rather than by
//! capping the pool at size 1 — readers still fan out concurrently.

use crate::error::{Result, StorageError};
use crate::schema;
use r2d2_sqlite::SqliteConnectionManager;

pub type Pool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Build a pool against a file path and apply the schema once up front.
/// `path` may be `:memory:`-style for tests, though each pooled
/// connection to `:memory:` is a distinct database — tests that need a
/// shared in-memory database should use a `file::memory:?cache=shared`
/// URI instead.
pub fn build_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.pragma_update(None, "busy_timeout", 5_000)?;
        Ok(())
    });
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(StorageError::Pool)?;

    let conn = pool.get().map_err(StorageError::Pool)?;
    schema::init_schema(&conn)?;
    Ok(pool)
}
