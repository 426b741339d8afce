//! Build info, read from the compiled-in cargo package metadata — no
//! separate version file to keep in sync.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct VersionResponse {
    name: &'static str,
    version: &'static str,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
