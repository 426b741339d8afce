use super::*;
use quaero_core::{DetailLevel, Document, DocumentId};

fn a_document(id: &str, source_type: SourceType, content: &str) -> Document {
    Document {
        id: DocumentId::new(id),
        source_type,
        source_id: id.to_string(),
        title: "onboarding guide".to_string(),
        content_markdown: content.to_string(),
        url: "https://example.com".to_string(),
        detail_level: DetailLevel::Full,
        metadata: Default::default(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn finds_a_matching_document() {
    let state = crate::test_support::test_state();
    state
        .storage
        .documents
        .upsert(a_document("d1", SourceType::Confluence, "how to configure the rate limiter"))
        .expect("upsert");

    let request = SearchRequest { query: "rate limiter".to_string(), limit: 20, source_types: Vec::new() };
    let results = search(State(state), Json(request)).await.expect("search");
    assert_eq!(results.0.len(), 1);
}

#[tokio::test]
async fn filters_by_source_type() {
    let state = crate::test_support::test_state();
    state
        .storage
        .documents
        .upsert(a_document("d1", SourceType::Confluence, "deploying the crawler"))
        .expect("upsert");
    state
        .storage
        .documents
        .upsert(a_document("d2", SourceType::Github, "deploying the crawler"))
        .expect("upsert");

    let request = SearchRequest {
        query: "crawler".to_string(),
        limit: 20,
        source_types: vec!["github".to_string()],
    };
    let results = search(State(state), Json(request)).await.expect("search");
    assert_eq!(results.0.len(), 1);
    assert_eq!(results.0[0].source_type, SourceType::Github);
}

#[tokio::test]
async fn rejects_an_empty_query() {
    let state = crate::test_support::test_state();
    let request = SearchRequest { query: "   ".to_string(), limit: 20, source_types: Vec::new() };
    let err = search(State(state), Json(request)).await.unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
}
