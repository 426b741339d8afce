//! The seam between this crate and persistence. `quaero-crawler` never
//! touches `quaero-storage` directly — callers (the engine crate) hand
//! in a `CrawlSink` implementation that wires scrape results into the
//! transformer, the document store, and the job manager.

use async_trait::async_trait;
use quaero_adapters::ScrapeResult;
use quaero_core::JobId;

/// One page the worker pool fetched, ready for the sink to transform
/// and persist.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub depth: u32,
    pub discovered_by: Option<String>,
    pub result: ScrapeResult,
}

#[async_trait]
pub trait CrawlSink: Send + Sync {
    /// Create a per-URL child job under `parent`, returning its id so
    /// the worker pool can report completion/failure against it.
    async fn spawn_child_job(&self, parent: &JobId, url: &str) -> anyhow::Result<JobId>;

    async fn mark_child_completed(&self, child: &JobId) -> anyhow::Result<()>;

    async fn mark_child_failed(&self, child: &JobId, error: &str) -> anyhow::Result<()>;

    /// Transform and upsert a scraped page, incrementing the parent
    /// job's document count.
    async fn record_scrape(&self, parent: &JobId, page: ScrapedPage) -> anyhow::Result<()>;

    async fn heartbeat(&self, job: &JobId) -> anyhow::Result<()>;

    async fn publish_progress(&self, job: &JobId, visited: u64, queued: u64) -> anyhow::Result<()>;
}

/// No-op sink for tests exercising only queue/visited-set/retry
/// behaviour, not the transform pipeline.
#[cfg(any(test, feature = "test-support"))]
pub struct NoopSink;

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl CrawlSink for NoopSink {
    async fn spawn_child_job(&self, _parent: &JobId, url: &str) -> anyhow::Result<JobId> {
        Ok(JobId::new(url.to_string()))
    }

    async fn mark_child_completed(&self, _child: &JobId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn mark_child_failed(&self, _child: &JobId, _error: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn record_scrape(&self, _parent: &JobId, _page: ScrapedPage) -> anyhow::Result<()> {
        Ok(())
    }

    async fn heartbeat(&self, _job: &JobId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish_progress(&self, _job: &JobId, _visited: u64, _queued: u64) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records every call it receives, for assertions in tests that care
/// about *what* happened rather than just that the crawl finished.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct RecordingSink {
    pub scraped: parking_lot::Mutex<Vec<ScrapedPage>>,
    pub failed: parking_lot::Mutex<Vec<(JobId, String)>>,
    pub completed: parking_lot::Mutex<Vec<JobId>>,
    id_counter: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl CrawlSink for RecordingSink {
    async fn spawn_child_job(&self, _parent: &JobId, _url: &str) -> anyhow::Result<JobId> {
        let n = self.id_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(JobId::new(format!("child-{n}")))
    }

    async fn mark_child_completed(&self, child: &JobId) -> anyhow::Result<()> {
        self.completed.lock().push(child.clone());
        Ok(())
    }

    async fn mark_child_failed(&self, child: &JobId, error: &str) -> anyhow::Result<()> {
        self.failed.lock().push((child.clone(), error.to_string()));
        Ok(())
    }

    async fn record_scrape(&self, _parent: &JobId, page: ScrapedPage) -> anyhow::Result<()> {
        self.scraped.lock().push(page);
        Ok(())
    }

    async fn heartbeat(&self, _job: &JobId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish_progress(&self, _job: &JobId, _visited: u64, _queued: u64) -> anyhow::Result<()> {
        Ok(())
    }
}
