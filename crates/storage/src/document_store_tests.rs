use super::*;
use crate::pool::build_pool;
use quaero_core::FakeClock;
use serde_json::json;
use std::sync::Arc;

fn store() -> DocumentStore {
    store_with_pool().0
}

fn store_with_pool() -> (DocumentStore, Pool) {
    let path = tempfile::NamedTempFile::new().unwrap();
    let pool = build_pool(path.path().to_str().unwrap()).unwrap();
    std::mem::forget(path);
    (DocumentStore::new(pool.clone(), Arc::new(FakeClock::new())), pool)
}

fn doc(source_id: &str, detail_level: DetailLevel) -> Document {
    Document {
        id: DocumentId::new(format!("doc-{source_id}")),
        source_type: SourceType::Generic,
        source_id: source_id.to_string(),
        title: "Title".into(),
        content_markdown: "searchable content body".into(),
        url: format!("http://test/{source_id}"),
        detail_level,
        metadata: serde_json::Map::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn upsert_inserts_new_document() {
    let store = store();
    let saved = store.upsert(doc("a", DetailLevel::Basic)).unwrap();
    let fetched = store.get(&saved.id).unwrap();
    assert_eq!(fetched.source_id, "a");
    assert_eq!(fetched.detail_level, DetailLevel::Basic);
}

#[test]
fn upsert_merges_on_existing_identity() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();

    let mut richer = doc("a", DetailLevel::Full);
    richer.title = "Richer Title".into();
    let merged = store.upsert(richer).unwrap();

    assert_eq!(merged.detail_level, DetailLevel::Full);
    assert_eq!(merged.title, "Richer Title");
}

#[test]
fn upsert_keeps_richer_existing_content_over_poorer_incoming() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Full)).unwrap();

    let mut poorer = doc("a", DetailLevel::Minimal);
    poorer.title = "Stub Title".into();
    let merged = store.upsert(poorer).unwrap();

    assert_eq!(merged.detail_level, DetailLevel::Full);
    assert_ne!(merged.title, "Stub Title");
}

#[test]
fn upsert_merges_metadata_instead_of_replacing() {
    let store = store();
    let mut first = doc("a", DetailLevel::Basic);
    first.metadata.insert("keywords".into(), json!(["rust"]));
    store.upsert(first).unwrap();

    let mut second = doc("a", DetailLevel::Basic);
    second.metadata.insert("summary".into(), json!("a summary"));
    let merged = store.upsert(second).unwrap();

    assert_eq!(merged.metadata.get("keywords"), Some(&json!(["rust"])));
    assert_eq!(merged.metadata.get("summary"), Some(&json!("a summary")));
}

#[test]
fn full_text_search_finds_matching_documents() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();

    let results = store.full_text_search("searchable", 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_id, "a");
}

#[test]
fn full_text_search_returns_empty_for_no_match() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();

    let results = store.full_text_search("nonexistentterm", 10).unwrap();
    assert!(results.is_empty());
}

#[test]
fn get_missing_document_is_not_found() {
    let store = store();
    let err = store.get(&DocumentId::new("missing")).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[test]
fn increment_document_count_bumps_job_metadata_atomically() {
    let (store, pool) = store_with_pool();
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO jobs (id, kind, status, metadata, heartbeat_at, created_at)
         VALUES ('j1', 'crawler', 'running', '{}', '2026-01-01', '2026-01-01')",
        [],
    )
    .unwrap();

    store.increment_document_count("j1").unwrap();
    store.increment_document_count("j1").unwrap();

    let metadata: String = conn
        .query_row("SELECT metadata FROM jobs WHERE id = 'j1'", [], |row| row.get(0))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&metadata).unwrap();
    assert_eq!(value["document_count"], 2);
}

#[test]
fn increment_document_count_on_missing_job_is_not_found() {
    let store = store();
    let err = store.increment_document_count("missing").unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[test]
fn list_needing_summary_skips_documents_already_summarised() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();
    let mut summarised = doc("b", DetailLevel::Basic);
    summarised.metadata.insert("summary".into(), json!("already done"));
    store.upsert(summarised).unwrap();

    let due = store.list_needing_summary(Utc::now() + chrono::Duration::days(1), 10).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].source_id, "a");
}

#[test]
fn list_needing_summary_respects_freshness_cutoff() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();

    let due = store.list_needing_summary(Utc::now() - chrono::Duration::days(1), 10).unwrap();
    assert!(due.is_empty());
}

#[test]
fn merge_metadata_writes_summary_without_touching_content() {
    let store = store();
    let saved = store.upsert(doc("a", DetailLevel::Basic)).unwrap();

    let mut patch = serde_json::Map::new();
    patch.insert("summary".into(), json!("a two sentence summary"));
    patch.insert("keywords".into(), json!(["rust", "crawler"]));
    let merged = store.merge_metadata(&saved.id, patch).unwrap();

    assert_eq!(merged.metadata.get("summary").and_then(|v| v.as_str()), Some("a two sentence summary"));
    assert_eq!(merged.content_markdown, saved.content_markdown);
}

#[test]
fn list_paginated_filters_by_source_type_and_paginates() {
    let store = store();
    store.upsert(doc("a", DetailLevel::Basic)).unwrap();
    store.upsert(doc("b", DetailLevel::Basic)).unwrap();

    let all = store.list_paginated(None, 10, 0).unwrap();
    assert_eq!(all.len(), 2);

    let generic_only = store.list_paginated(Some(SourceType::Generic), 10, 0).unwrap();
    assert_eq!(generic_only.len(), 2);

    let page = store.list_paginated(None, 1, 1).unwrap();
    assert_eq!(page.len(), 1);
}

#[test]
fn delete_many_removes_the_given_ids_and_reports_the_count() {
    let store = store();
    let a = store.upsert(doc("a", DetailLevel::Basic)).unwrap();
    store.upsert(doc("b", DetailLevel::Basic)).unwrap();

    let removed = store.delete_many(&[a.id.clone(), DocumentId::new("missing")]).unwrap();

    assert_eq!(removed, 1);
    assert!(store.get(&a.id).is_err());
}
