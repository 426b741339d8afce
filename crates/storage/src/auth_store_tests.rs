use super::*;
use crate::pool::build_pool;
use quaero_core::{Cookie, FakeClock};
use std::collections::HashMap;

fn store() -> AuthStore {
    let path = tempfile::NamedTempFile::new().unwrap();
    let pool = build_pool(path.path().to_str().unwrap()).unwrap();
    std::mem::forget(path);
    AuthStore::new(pool, Arc::new(FakeClock::new()))
}

fn snapshot(id: &str) -> AuthSnapshot {
    let mut tokens = HashMap::new();
    tokens.insert("atl_token".to_string(), "abc123".to_string());
    AuthSnapshot {
        id: AuthId::new(id),
        cookies: vec![Cookie {
            name: "session".into(),
            value: "xyz".into(),
            domain: "test.internal".into(),
            path: "/".into(),
            expiry: None,
        }],
        tokens,
        base_url: "http://test.internal".into(),
        user_agent: "quaero/0.1".into(),
        updated_at: chrono::Utc::now(),
    }
}

#[test]
fn save_then_resolve_round_trips() {
    let store = store();
    store.save(snapshot("auth1")).unwrap();

    let resolved = store.resolve(&AuthId::new("auth1")).unwrap();
    assert_eq!(resolved.base_url, "http://test.internal");
    assert_eq!(resolved.tokens.get("atl_token").map(String::as_str), Some("abc123"));
}

#[test]
fn save_replaces_existing_snapshot() {
    let store = store();
    store.save(snapshot("auth1")).unwrap();

    let mut updated = snapshot("auth1");
    updated.user_agent = "quaero/0.2".into();
    store.save(updated).unwrap();

    let resolved = store.resolve(&AuthId::new("auth1")).unwrap();
    assert_eq!(resolved.user_agent, "quaero/0.2");
}

#[test]
fn resolve_missing_auth_is_not_found() {
    let store = store();
    let err = store.resolve(&AuthId::new("missing")).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[test]
fn list_returns_every_saved_snapshot() {
    let store = store();
    store.save(snapshot("auth1")).unwrap();
    store.save(snapshot("auth2")).unwrap();

    let all = store.list().unwrap();

    assert_eq!(all.len(), 2);
}

#[test]
fn delete_removes_the_snapshot() {
    let store = store();
    store.save(snapshot("auth1")).unwrap();

    store.delete(&AuthId::new("auth1")).unwrap();

    assert!(store.resolve(&AuthId::new("auth1")).is_err());
}

#[test]
fn delete_missing_auth_is_not_found() {
    let store = store();
    let err = store.delete(&AuthId::new("missing")).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}
