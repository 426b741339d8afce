//! HTTP handlers, one module per resource in the JSON API. Routing
//! itself lives in [`crate::router`]; these modules only know about
//! [`crate::state::AppState`] and their own request/response shapes.

pub mod auths;
pub mod chat;
pub mod documents;
pub mod health;
pub mod job_definitions;
pub mod jobs;
pub mod search;
pub mod sources;
pub mod version;
