#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-storage: SQLite-backed persistence for documents, jobs, job
//! definitions, sources, and auth snapshots. A fixed schema is applied
//! once at startup (`schema::init_schema`) — there is no migration
//! framework; each sub-store exposes typed, context-aware operations
//! through the composite [`StorageManager`].

mod auth_store;
mod document_store;
mod error;
mod job_definition_store;
mod job_store;
mod maintenance;
mod manager;
mod pool;
mod schema;
mod source_store;

pub use auth_store::AuthStore;
pub use document_store::DocumentStore;
pub use error::{Result, StorageError};
pub use job_definition_store::JobDefinitionStore;
pub use job_store::JobStore;
pub use maintenance::{MaintenanceReport, MaintenanceStore};
pub use manager::StorageManager;
pub use pool::{build_pool, Pool, PooledConnection};
pub use schema::init_schema;
pub use source_store::SourceStore;
