//! Route table for the JSON API plus the WebSocket upgrade (§6.1,
//! §4.11). HTML pages and static assets are out of scope — this router
//! serves the API surface only.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;
use crate::ws;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::upgrade))
        .route("/api/health", get(api::health::health))
        .route("/api/version", get(api::version::version))
        .route("/api/sources", get(api::sources::list).post(api::sources::create))
        .route(
            "/api/sources/:id",
            get(api::sources::get).put(api::sources::update).delete(api::sources::delete),
        )
        .route("/api/auths", get(api::auths::list).post(api::auths::create))
        .route(
            "/api/auths/:id",
            get(api::auths::get).put(api::auths::update).delete(api::auths::delete),
        )
        .route("/api/jobs", get(api::jobs::list).post(api::jobs::create))
        .route("/api/jobs/:id", get(api::jobs::get))
        .route("/api/jobs/:id/cancel", post(api::jobs::cancel))
        .route(
            "/api/job-definitions",
            get(api::job_definitions::list).post(api::job_definitions::create),
        )
        .route(
            "/api/job-definitions/:id",
            get(api::job_definitions::get)
                .put(api::job_definitions::update)
                .delete(api::job_definitions::delete),
        )
        .route("/api/documents", get(api::documents::list).delete(api::documents::delete))
        .route("/api/documents/:id", get(api::documents::get))
        .route("/api/search", post(api::search::search))
        .route("/api/chat", post(api::chat::chat))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
