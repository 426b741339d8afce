use super::*;

#[tokio::test]
async fn auth_frame_saves_a_new_snapshot_when_no_id_is_given() {
    let state = crate::test_support::test_state();
    let text = r#"{"type":"auth","payload":{"cookies":[],"tokens":{},"base_url":"https://example.atlassian.net","user_agent":"quaero-extension/0.1"}}"#;

    handle_inbound_frame(&state, text).await;

    let saved = state.storage.auth.list().expect("list");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].base_url, "https://example.atlassian.net");
}

#[tokio::test]
async fn auth_frame_with_an_id_overwrites_the_existing_snapshot() {
    let state = crate::test_support::test_state();
    let first = r#"{"type":"auth","payload":{"auth_id":"a1","cookies":[],"tokens":{},"base_url":"https://old.example.com","user_agent":"ua"}}"#;
    handle_inbound_frame(&state, first).await;

    let second = r#"{"type":"auth","payload":{"auth_id":"a1","cookies":[],"tokens":{},"base_url":"https://new.example.com","user_agent":"ua"}}"#;
    handle_inbound_frame(&state, second).await;

    let saved = state.storage.auth.resolve(&AuthId::new("a1")).expect("resolve");
    assert_eq!(saved.base_url, "https://new.example.com");
}

#[tokio::test]
async fn unrecognised_frame_type_is_dropped_without_error() {
    let state = crate::test_support::test_state();
    handle_inbound_frame(&state, r#"{"type":"ping","payload":{}}"#).await;
    assert!(state.storage.auth.list().expect("list").is_empty());
}

#[tokio::test]
async fn unparseable_frame_is_dropped_without_error() {
    let state = crate::test_support::test_state();
    handle_inbound_frame(&state, "not json").await;
    assert!(state.storage.auth.list().expect("list").is_empty());
}
