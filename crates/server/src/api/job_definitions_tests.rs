use super::*;
use quaero_core::ErrorTolerance;

fn a_definition(id: &str, schedule: Option<&str>) -> JobDefinition {
    JobDefinition {
        id: JobDefinitionId::new(id),
        name: format!("definition-{id}"),
        kind: quaero_core::JobKind::Crawler,
        description: String::new(),
        sources: Vec::new(),
        steps: Vec::new(),
        schedule: schedule.map(str::to_string),
        timeout_secs: 3600,
        enabled: true,
        auto_start: false,
        config: Default::default(),
        pre_jobs: Vec::new(),
        post_jobs: Vec::new(),
        error_tolerance: ErrorTolerance::Strict,
        config_error: None,
    }
}

#[tokio::test]
async fn create_with_a_valid_schedule_stays_enabled() {
    let state = crate::test_support::test_state();
    let created = create(State(state), Json(a_definition("d1", Some("*/15 * * * *")))).await.expect("create");
    assert!(created.0.enabled);
    assert!(created.0.config_error.is_none());
}

#[tokio::test]
async fn create_with_an_invalid_schedule_is_registered_disabled() {
    let state = crate::test_support::test_state();
    let created = create(State(state), Json(a_definition("d1", Some("not a cron expression")))).await.expect("create");
    assert!(!created.0.enabled);
    assert!(created.0.config_error.is_some());
}

#[tokio::test]
async fn update_overwrites_the_id_from_the_path() {
    let state = crate::test_support::test_state();
    create(State(state.clone()), Json(a_definition("d1", None))).await.expect("create");

    let mut payload = a_definition("ignored", None);
    payload.name = "renamed".to_string();
    let updated = update(State(state), Path("d1".to_string()), Json(payload)).await.expect("update");
    assert_eq!(updated.0.id, JobDefinitionId::new("d1"));
    assert_eq!(updated.0.name, "renamed");
}

#[tokio::test]
async fn delete_removes_the_definition() {
    let state = crate::test_support::test_state();
    create(State(state.clone()), Json(a_definition("d1", None))).await.expect("create");

    delete(State(state.clone()), Path("d1".to_string())).await.expect("delete");
    let err = get(State(state), Path("d1".to_string())).await.unwrap_err();
    assert!(matches!(err, ApiError::Storage(_)));
}
