//! Document persistence: smart-upsert by `(source_type, source_id)` and
//! BM25-ranked full-text search over the FTS5 shadow table.

use crate::error::{Result, StorageError};
use crate::pool::Pool;
use chrono::{DateTime, Utc};
use quaero_core::{merge_metadata, Clock, DetailLevel, Document, DocumentId, SourceType};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;

pub struct DocumentStore {
    pool: Pool,
    clock: Arc<dyn Clock>,
}

impl DocumentStore {
    pub fn new(pool: Pool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Insert a document, or merge it into the existing row sharing its
    /// `(source_type, source_id)` identity via [`Document::smart_upsert`].
    pub fn upsert(&self, incoming: Document) -> Result<Document> {
        let conn = self.pool.get()?;
        let now = self.clock.now();

        let existing = find_by_identity(&conn, incoming.source_type, &incoming.source_id)?;
        let merged = match existing {
            Some(mut existing) => {
                Document::smart_upsert(&mut existing, incoming, now);
                existing
            }
            None => {
                let mut doc = incoming;
                doc.created_at = now;
                doc.updated_at = now;
                doc
            }
        };

        write_row(&conn, &merged)?;
        Ok(merged)
    }

    pub fn get(&self, id: &DocumentId) -> Result<Document> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
             FROM documents WHERE id = ?1",
            params![id.as_str()],
            row_to_document,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound {
            entity: "document",
            id: id.as_str().to_string(),
        })
    }

    /// BM25-ranked full-text search; ties broken by `updated_at` descending.
    pub fn full_text_search(&self, query: &str, limit: u32) -> Result<Vec<Document>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT d.id, d.source_type, d.source_id, d.title, d.content_markdown, d.url, d.detail_level, d.metadata, d.created_at, d.updated_at
             FROM documents_fts f
             JOIN documents d ON d.rowid = f.rowid
             WHERE documents_fts MATCH ?1
             ORDER BY bm25(documents_fts) ASC, d.updated_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![query, limit], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Atomically bump `metadata.document_count` on a job row by one,
    /// without a read-modify-write round trip.
    pub fn increment_document_count(&self, job_id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "UPDATE jobs
             SET metadata = json_set(metadata, '$.document_count',
                 COALESCE(json_extract(metadata, '$.document_count'), 0) + 1)
             WHERE id = ?1",
            params![job_id],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound {
                entity: "job",
                id: job_id.to_string(),
            });
        }
        Ok(())
    }

    /// Documents with no `metadata.summary` yet, whose `updated_at` is
    /// older than `freshness_cutoff` — the summariser executor's work
    /// queue. Skipping anything touched after the cutoff gives an
    /// in-flight crawl time to settle before it gets summarised.
    pub fn list_needing_summary(
        &self,
        freshness_cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Document>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
             FROM documents
             WHERE json_extract(metadata, '$.summary') IS NULL AND updated_at <= ?1
             ORDER BY updated_at ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![freshness_cutoff.to_rfc3339(), limit], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Paginated listing, most recently updated first, optionally
    /// filtered to a single source type. Backs the documents API's list
    /// endpoint.
    pub fn list_paginated(
        &self,
        source_type: Option<SourceType>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Document>> {
        let conn = self.pool.get()?;
        let rows = match source_type {
            Some(source_type) => {
                let mut stmt = conn.prepare(
                    "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
                     FROM documents WHERE source_type = ?1
                     ORDER BY updated_at DESC LIMIT ?2 OFFSET ?3",
                )?;
                stmt.query_map(params![source_type.as_str(), limit, offset], row_to_document)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
                     FROM documents
                     ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
                )?;
                stmt.query_map(params![limit, offset], row_to_document)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    /// Bulk delete by id; returns the number of rows actually removed
    /// so a caller can tell a partially-missing batch from a clean one.
    pub fn delete_many(&self, ids: &[DocumentId]) -> Result<u64> {
        let conn = self.pool.get()?;
        let mut removed = 0u64;
        for id in ids {
            removed += conn.execute("DELETE FROM documents WHERE id = ?1", params![id.as_str()])? as u64;
        }
        Ok(removed)
    }

    /// Merge `patch` into a document's metadata in place (non-empty
    /// incoming values win per key, per [`quaero_core::merge_metadata`])
    /// and bump `updated_at`. Used by the summariser executor to attach
    /// `summary`/`keywords`/`last_summarized` without disturbing content.
    pub fn merge_metadata(&self, id: &DocumentId, patch: Map<String, Value>) -> Result<Document> {
        let conn = self.pool.get()?;
        let mut doc = conn
            .query_row(
                "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
                 FROM documents WHERE id = ?1",
                params![id.as_str()],
                row_to_document,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound {
                entity: "document",
                id: id.as_str().to_string(),
            })?;

        merge_metadata(&mut doc.metadata, patch);
        doc.updated_at = self.clock.now();
        write_row(&conn, &doc)?;
        Ok(doc)
    }
}

fn find_by_identity(
    conn: &Connection,
    source_type: SourceType,
    source_id: &str,
) -> Result<Option<Document>> {
    conn.query_row(
        "SELECT id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at
         FROM documents WHERE source_type = ?1 AND source_id = ?2",
        params![source_type.as_str(), source_id],
        row_to_document,
    )
    .optional()
    .map_err(StorageError::from)
}

fn write_row(conn: &Connection, doc: &Document) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (id, source_type, source_id, title, content_markdown, url, detail_level, metadata, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             content_markdown = excluded.content_markdown,
             url = excluded.url,
             detail_level = excluded.detail_level,
             metadata = excluded.metadata,
             updated_at = excluded.updated_at",
        params![
            doc.id.as_str(),
            doc.source_type.as_str(),
            doc.source_id,
            doc.title,
            doc.content_markdown,
            doc.url,
            doc.detail_level.as_str(),
            Value::Object(doc.metadata.clone()).to_string(),
            doc.created_at.to_rfc3339(),
            doc.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let source_type: String = row.get(1)?;
    let detail_level: String = row.get(6)?;
    let metadata: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    Ok(Document {
        id: DocumentId::new(row.get::<_, String>(0)?),
        source_type: SourceType::from_str(&source_type).unwrap_or(SourceType::Generic),
        source_id: row.get(2)?,
        title: row.get(3)?,
        content_markdown: row.get(4)?,
        url: row.get(5)?,
        detail_level: DetailLevel::from_str(&detail_level).unwrap_or(DetailLevel::Minimal),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        created_at: parse_rfc3339(&created_at),
        updated_at: parse_rfc3339(&updated_at),
    })
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
#[path = "document_store_tests.rs"]
mod tests;
