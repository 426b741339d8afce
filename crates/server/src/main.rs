//! `quaerod`: boots storage, the job engine, and the HTTP/WebSocket
//! front end in one process. Configuration is a single optional TOML
//! file path (first CLI argument, falling back to `QUAERO_CONFIG`, then
//! to built-in defaults) — env merging and flag parsing beyond that are
//! out of scope here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration as ChronoDuration;
use quaero_adapters::{HttpLlmService, LlmService, ReqwestScraper, TokenBucketRateLimiter};
use quaero_core::{Clock, Config, EventBus, SystemClock, UuidIdGen};
use quaero_engine::executors::{CrawlerExecutor, MaintenanceExecutor, ParentAggregator, SummariserExecutor};
use quaero_engine::{Dispatcher, JobManager, Scheduler};
use quaero_server::build_router;
use quaero_storage::StorageManager;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Retention window for terminal jobs, swept by the maintenance
/// executor. Not part of `Config` — the maintenance job's schedule
/// (config-driven) is what actually governs how often this runs.
const MAINTENANCE_RETENTION_DAYS: i64 = 90;
const SUMMARY_FRESHNESS_HOURS: i64 = 24;
const SUMMARY_BATCH_LIMIT: u32 = 20;
const SCHEDULER_TICK_INTERVAL: StdDuration = StdDuration::from_secs(30);
const STALE_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(300);
const STALE_THRESHOLD_MINUTES: i64 = 10;

fn load_config() -> Config {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var("QUAERO_CONFIG").ok().map(PathBuf::from));

    match path {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                eprintln!("warning: failed to parse config at {}: {err}, using defaults", path.display());
                Config::default()
            }),
            Err(err) => {
                eprintln!("warning: failed to read config at {}: {err}, using defaults", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    }
}

fn setup_logging(data_dir: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = PathBuf::from(data_dir).join("logs");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "quaerod.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();
    std::fs::create_dir_all(&config.server.data_dir)?;
    let _log_guard = setup_logging(&config.server.data_dir);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting quaerod");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let id_gen = Arc::new(UuidIdGen);

    let storage = Arc::new(StorageManager::open(&config.server.database_path(), Arc::clone(&clock))?);
    let seeded = storage.seed_job_definitions(&config.default_job_definitions, id_gen.as_ref())?;
    tracing::info!(seeded, "seeded default job definitions");

    let bus = EventBus::new();
    let job_manager = Arc::new(JobManager::new(Arc::clone(&storage), bus.clone(), id_gen.clone()));

    bus.subscribe_sync(Arc::new(ParentAggregator::new(Arc::clone(&job_manager))));

    let rate_limiter = Arc::new(TokenBucketRateLimiter::new(config.rate_limit.clone().into()));
    let scraper = Arc::new(ReqwestScraper::new(rate_limiter));
    let llm: Arc<dyn LlmService> = Arc::new(HttpLlmService::from_config(&config.llm));

    let crawler_executor = Arc::new(CrawlerExecutor::new(
        Arc::clone(&storage),
        Arc::clone(&job_manager),
        scraper,
        id_gen.clone(),
        Arc::clone(&clock),
        config.crawler.clone(),
    ));
    let maintenance_executor = Arc::new(MaintenanceExecutor::new(
        Arc::clone(&storage),
        Arc::clone(&clock),
        MAINTENANCE_RETENTION_DAYS,
    ));
    let summariser_executor = Arc::new(SummariserExecutor::new(
        Arc::clone(&storage),
        Arc::clone(&llm),
        Arc::clone(&clock),
        ChronoDuration::hours(SUMMARY_FRESHNESS_HOURS),
        SUMMARY_BATCH_LIMIT,
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&job_manager),
        crawler_executor,
        maintenance_executor,
        summariser_executor,
    ));
    let scheduler = Scheduler::new(Arc::clone(&job_manager), Arc::clone(&storage), Arc::clone(&dispatcher), clock);

    let orphaned = scheduler.recover_orphaned_jobs()?;
    if orphaned > 0 {
        tracing::warn!(orphaned, "failed jobs left running at last shutdown");
    }
    scheduler.run_auto_start()?;

    spawn_scheduler_loops(Arc::clone(&scheduler));

    let state = quaero_server::AppState {
        storage,
        job_manager,
        scheduler: Arc::clone(&scheduler),
        dispatcher,
        llm,
        bus,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "quaerod listening");

    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await?;

    tracing::info!("quaerod exited");
    Ok(())
}

/// Cron-tick and stale-job sweep loops — the scheduler's two long-lived
/// background tickers (§5, "two long-lived goroutines").
fn spawn_scheduler_loops(scheduler: Arc<Scheduler>) {
    let tick_scheduler = Arc::clone(&scheduler);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SCHEDULER_TICK_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(err) = tick_scheduler.tick_once() {
                tracing::error!(error = %err, "scheduler tick failed");
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STALE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match scheduler.sweep_stale_jobs(STALE_THRESHOLD_MINUTES) {
                Ok(count) if count > 0 => tracing::warn!(count, "swept stale jobs"),
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "stale job sweep failed"),
            }
        }
    });
}

async fn shutdown_signal(scheduler: Arc<Scheduler>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            tracing::error!(error = %err, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(err) => {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }

    scheduler.graceful_shutdown().await;
}
