use super::*;
use quaero_core::{DetailLevel, SourceType};

fn a_document(id: &str, source_id: &str, source_type: SourceType) -> Document {
    Document {
        id: DocumentId::new(id),
        source_type,
        source_id: source_id.to_string(),
        title: "a title".to_string(),
        content_markdown: "some markdown content".to_string(),
        url: "https://example.com/page".to_string(),
        detail_level: DetailLevel::Full,
        metadata: Default::default(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn list_filters_by_source_type() {
    let state = crate::test_support::test_state();
    state.storage.documents.upsert(a_document("d1", "doc-1", SourceType::Github)).expect("upsert");
    state.storage.documents.upsert(a_document("d2", "doc-2", SourceType::Jira)).expect("upsert");

    let query = DocumentListQuery { source_type: Some("github".to_string()), limit: 50, offset: 0 };
    let docs = list(State(state.clone()), Query(query)).await.expect("list");
    assert_eq!(docs.0.len(), 1);
    assert_eq!(docs.0[0].source_type, SourceType::Github);

    let query = DocumentListQuery { source_type: None, limit: 50, offset: 0 };
    let docs = list(State(state), Query(query)).await.expect("list");
    assert_eq!(docs.0.len(), 2);
}

#[tokio::test]
async fn list_rejects_an_unknown_source_type() {
    let state = crate::test_support::test_state();
    let query = DocumentListQuery { source_type: Some("bogus".to_string()), limit: 50, offset: 0 };
    let err = list(State(state), Query(query)).await.unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
}

#[tokio::test]
async fn get_missing_document_is_not_found() {
    let state = crate::test_support::test_state();
    let err = get(State(state), Path("missing".to_string())).await.unwrap_err();
    assert!(matches!(err, ApiError::Storage(_)));
}

#[tokio::test]
async fn delete_removes_the_given_ids() {
    let state = crate::test_support::test_state();
    let stored = state.storage.documents.upsert(a_document("d1", "doc-1", SourceType::Github)).expect("upsert");

    let request = DeleteDocumentsRequest { ids: vec![stored.id.as_str().to_string()] };
    let count = delete(State(state.clone()), Json(request)).await.expect("delete");
    assert_eq!(count.0, 1);

    let err = get(State(state), Path(stored.id.as_str().to_string())).await.unwrap_err();
    assert!(matches!(err, ApiError::Storage(_)));
}
