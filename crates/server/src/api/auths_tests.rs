use super::*;
use std::collections::HashMap;

fn a_snapshot(id: &str) -> AuthSnapshot {
    AuthSnapshot {
        id: AuthId::new(id),
        cookies: Vec::new(),
        tokens: HashMap::new(),
        base_url: "https://example.atlassian.net".to_string(),
        user_agent: "quaero-extension/0.1".to_string(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let state = crate::test_support::test_state();
    create(State(state.clone()), Json(a_snapshot("a1"))).await.expect("create");

    let fetched = get(State(state), Path("a1".to_string())).await.expect("get");
    assert_eq!(fetched.0.id, AuthId::new("a1"));
}

#[tokio::test]
async fn update_replaces_the_snapshot_wholesale() {
    let state = crate::test_support::test_state();
    create(State(state.clone()), Json(a_snapshot("a1"))).await.expect("create");

    let mut payload = a_snapshot("ignored");
    payload.user_agent = "new-agent".to_string();
    update(State(state.clone()), Path("a1".to_string()), Json(payload)).await.expect("update");

    let fetched = get(State(state), Path("a1".to_string())).await.expect("get");
    assert_eq!(fetched.0.user_agent, "new-agent");
}

#[tokio::test]
async fn delete_removes_the_snapshot() {
    let state = crate::test_support::test_state();
    create(State(state.clone()), Json(a_snapshot("a1"))).await.expect("create");

    delete(State(state.clone()), Path("a1".to_string())).await.expect("delete");
    let err = get(State(state), Path("a1".to_string())).await.unwrap_err();
    assert!(matches!(err, ApiError::Storage(_)));
}
