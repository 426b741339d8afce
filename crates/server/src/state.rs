//! Everything an HTTP handler or the WebSocket gateway needs, built
//! once at startup in `main` and cloned cheaply (every field is an
//! `Arc` or already `Clone`) into each request's `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use quaero_adapters::LlmService;
use quaero_core::{Config, EventBus};
use quaero_engine::{Dispatcher, JobManager, Scheduler};
use quaero_storage::StorageManager;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageManager>,
    pub job_manager: Arc<JobManager>,
    pub scheduler: Arc<Scheduler>,
    pub dispatcher: Arc<Dispatcher>,
    pub llm: Arc<dyn LlmService>,
    pub bus: EventBus,
    pub config: Arc<Config>,
    pub start_time: Instant,
}
