//! Shared fixture builder for the handler/router/websocket test modules.
//! Builds a fully wired [`AppState`] over a throwaway on-disk SQLite file
//! with a [`FakeClock`] and a [`FakeLlmService`], the same substitution
//! pattern `quaero-engine`'s scheduler tests use for storage.

use std::sync::Arc;
use std::time::Instant;

use quaero_adapters::{FakeLlmService, FakeScraper, LlmService, PageMetadata, ScrapeResult};
use quaero_core::{Clock, Config, EventBus, FakeClock, UuidIdGen};
use quaero_engine::executors::{CrawlerExecutor, JobExecutor, MaintenanceExecutor, SummariserExecutor};
use quaero_engine::{Dispatcher, JobManager, Scheduler};
use quaero_storage::StorageManager;

use crate::state::AppState;

/// Leaks the backing tempfile so the pool stays valid for the test's
/// lifetime, mirroring `quaero_engine::scheduler_tests::scheduler_with`.
pub fn test_state() -> AppState {
    let path = tempfile::NamedTempFile::new().expect("tempfile");
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let storage = Arc::new(
        StorageManager::open(path.path().to_str().expect("utf8 path"), Arc::clone(&clock)).expect("open storage"),
    );
    std::mem::forget(path);

    let bus = EventBus::new();
    let id_gen = Arc::new(UuidIdGen);
    let job_manager = Arc::new(JobManager::new(Arc::clone(&storage), bus.clone(), id_gen.clone()));

    let scraper = Arc::new(FakeScraper {
        result: ScrapeResult {
            url: String::new(),
            status_code: 200,
            markdown: String::new(),
            raw_html: None,
            title: String::new(),
            description: None,
            language: None,
            links: Vec::new(),
            metadata: PageMetadata::default(),
            duration: std::time::Duration::from_millis(1),
        },
    });
    let llm: Arc<dyn LlmService> = Arc::new(FakeLlmService::new("fake reply"));

    let crawler_executor: Arc<dyn JobExecutor> = Arc::new(CrawlerExecutor::new(
        Arc::clone(&storage),
        Arc::clone(&job_manager),
        scraper,
        id_gen,
        Arc::clone(&clock),
        quaero_core::CrawlerDefaults::default(),
    ));
    let maintenance_executor: Arc<dyn JobExecutor> =
        Arc::new(MaintenanceExecutor::new(Arc::clone(&storage), Arc::clone(&clock), 90));
    let summariser_executor: Arc<dyn JobExecutor> = Arc::new(SummariserExecutor::new(
        Arc::clone(&storage),
        Arc::clone(&llm),
        Arc::clone(&clock),
        chrono::Duration::hours(24),
        20,
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&job_manager),
        crawler_executor,
        maintenance_executor,
        summariser_executor,
    ));
    let scheduler = Scheduler::new(Arc::clone(&job_manager), Arc::clone(&storage), Arc::clone(&dispatcher), clock);

    AppState {
        storage,
        job_manager,
        scheduler,
        dispatcher,
        llm,
        bus,
        config: Arc::new(Config::default()),
        start_time: Instant::now(),
    }
}
