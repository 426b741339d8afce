#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-server: the JSON HTTP API and WebSocket gateway that front
//! `quaero-engine`, plus the `quaerod` daemon binary's boot sequence.
//! Nothing in this crate writes a job's status or touches SQLite
//! directly — it only drives `quaero-storage`/`quaero-engine` through
//! their public APIs.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, Result};
pub use router::build_router;
pub use state::AppState;
