//! Liveness. Reports storage connectivity (a pooled connection can be
//! checked out) and scheduler liveness (uptime since boot), mirroring
//! the shape of a daemon status query without the namespace/worker
//! detail this process doesn't have.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    storage: &'static str,
    uptime_secs: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_ok = state.storage.pool().get().is_ok();
    Json(HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" },
        storage: if storage_ok { "ok" } else { "unreachable" },
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
