use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn health_endpoint_is_reachable() {
    let state = crate::test_support::test_state();
    let router = build_router(state);

    let req = Request::builder().uri("/api/health").body(Body::empty()).expect("request");
    let resp = router.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_source_returns_404_with_the_error_body_shape() {
    let state = crate::test_support::test_state();
    let router = build_router(state);

    let req = Request::builder().uri("/api/sources/missing").body(Body::empty()).expect("request");
    let resp = router.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn search_with_an_empty_query_returns_400() {
    let state = crate::test_support::test_state();
    let router = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query":""}"#))
        .expect("request");
    let resp = router.oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
