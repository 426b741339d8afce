//! Fixed schema, applied once at startup. There is no migration
//! framework: an absent database file is built from scratch; an
//! existing one is never altered by this code. Upgrading a live
//! database is the operator's job (recreate-from-source).

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    name TEXT NOT NULL,
    base_url TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    auth_id TEXT,
    crawl_config TEXT NOT NULL,
    filters TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS auth_snapshots (
    id TEXT PRIMARY KEY,
    cookies TEXT NOT NULL,
    tokens TEXT NOT NULL,
    base_url TEXT NOT NULL,
    user_agent TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS job_definitions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    sources TEXT NOT NULL DEFAULT '[]',
    steps TEXT NOT NULL DEFAULT '[]',
    schedule TEXT,
    timeout_secs INTEGER NOT NULL DEFAULT 3600,
    enabled INTEGER NOT NULL DEFAULT 1,
    auto_start INTEGER NOT NULL DEFAULT 0,
    config TEXT NOT NULL DEFAULT '{}',
    pre_jobs TEXT NOT NULL DEFAULT '[]',
    post_jobs TEXT NOT NULL DEFAULT '[]',
    error_tolerance TEXT NOT NULL DEFAULT 'strict',
    config_error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    definition_id TEXT REFERENCES job_definitions(id),
    parent_id TEXT REFERENCES jobs(id),
    kind TEXT NOT NULL,
    status TEXT NOT NULL,
    progress_current INTEGER NOT NULL DEFAULT 0,
    progress_total INTEGER NOT NULL DEFAULT 0,
    progress_text TEXT NOT NULL DEFAULT '',
    metadata TEXT NOT NULL DEFAULT '{}',
    error TEXT,
    heartbeat_at TEXT NOT NULL,
    started_at TEXT,
    finished_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_status_heartbeat ON jobs (status, heartbeat_at);
CREATE INDEX IF NOT EXISTS idx_jobs_parent_id ON jobs (parent_id);
CREATE INDEX IF NOT EXISTS idx_jobs_definition_id ON jobs (definition_id);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    source_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content_markdown TEXT NOT NULL,
    url TEXT NOT NULL,
    detail_level TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (source_type, source_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents (updated_at);

CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    title,
    content_markdown,
    content = 'documents',
    content_rowid = 'rowid'
);

CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
    INSERT INTO documents_fts(rowid, title, content_markdown)
    VALUES (new.rowid, new.title, new.content_markdown);
END;

CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, content_markdown)
    VALUES ('delete', old.rowid, old.title, old.content_markdown);
END;

CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, content_markdown)
    VALUES ('delete', old.rowid, old.title, old.content_markdown);
    INSERT INTO documents_fts(rowid, title, content_markdown)
    VALUES (new.rowid, new.title, new.content_markdown);
END;
"#;

/// Apply the fixed schema. Idempotent — safe to call on every startup.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "busy_timeout", 5_000)?;
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
