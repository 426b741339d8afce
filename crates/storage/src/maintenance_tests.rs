use super::*;
use crate::pool::build_pool;

fn store() -> (MaintenanceStore, Pool) {
    let path = tempfile::NamedTempFile::new().unwrap();
    let pool = build_pool(path.path().to_str().unwrap()).unwrap();
    std::mem::forget(path);
    (MaintenanceStore::new(pool.clone()), pool)
}

fn insert_job(pool: &Pool, id: &str, status: &str, finished_at: Option<&str>, parent_id: Option<&str>) {
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO jobs (id, parent_id, kind, status, metadata, heartbeat_at, finished_at, created_at)
         VALUES (?1, ?2, 'crawler', ?3, '{}', '2026-01-01', ?4, '2026-01-01')",
        params![id, parent_id, status, finished_at],
    )
    .unwrap();
}

#[test]
fn prune_terminal_jobs_removes_old_leaf_jobs() {
    let (store, pool) = store();
    insert_job(&pool, "old", "completed", Some("2020-01-01T00:00:00Z"), None);

    let pruned = store.prune_terminal_jobs(Utc::now()).unwrap();
    assert_eq!(pruned, 1);
}

#[test]
fn prune_terminal_jobs_keeps_jobs_still_referenced_as_a_parent() {
    let (store, pool) = store();
    insert_job(&pool, "parent", "completed", Some("2020-01-01T00:00:00Z"), None);
    insert_job(&pool, "child", "running", None, Some("parent"));

    let pruned = store.prune_terminal_jobs(Utc::now()).unwrap();
    assert_eq!(pruned, 0);
}

#[test]
fn prune_terminal_jobs_respects_cutoff() {
    let (store, pool) = store();
    insert_job(&pool, "recent", "completed", Some(&Utc::now().to_rfc3339()), None);

    let pruned = store.prune_terminal_jobs(Utc::now() - chrono::Duration::days(30)).unwrap();
    assert_eq!(pruned, 0);
}

#[test]
fn rebuild_fts_index_does_not_error_on_an_empty_table() {
    let (store, _pool) = store();
    store.rebuild_fts_index().unwrap();
}

#[test]
fn run_reports_what_it_did() {
    let (store, pool) = store();
    insert_job(&pool, "old", "failed", Some("2020-01-01T00:00:00Z"), None);

    let report = store.run(Utc::now()).unwrap();
    assert_eq!(report.jobs_pruned, 1);
    assert!(report.fts_rebuilt);
    assert!(report.vacuumed);
}
