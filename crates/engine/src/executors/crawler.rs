//! Runs one crawler job: resolves the source and its auth snapshot,
//! builds a [`CrawlRunConfig`], and drives [`CrawlerEngine`] with a sink
//! that transforms and persists each scraped page.

use async_trait::async_trait;
use quaero_adapters::{HtmlScraper, ScrapeOptions};
use quaero_core::{
    CancelToken, Clock, CrawlerDefaults, Event, IdGen, Job, JobId, JobKind, JobMetadata, JobSpec,
    JobStatus, SourceConfig,
};
use quaero_crawler::{CrawlError, CrawlOutcome, CrawlRunConfig, CrawlSink, CrawlerEngine, ScrapedPage};
use quaero_storage::StorageManager;
use std::sync::Arc;
use std::time::Duration;

use super::JobExecutor;
use crate::error::{EngineError, Result};
use crate::job_manager::JobManager;
use crate::transformer;

pub struct CrawlerExecutor {
    storage: Arc<StorageManager>,
    job_manager: Arc<JobManager>,
    scraper: Arc<dyn HtmlScraper>,
    id_gen: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
    defaults: CrawlerDefaults,
}

impl CrawlerExecutor {
    pub fn new(
        storage: Arc<StorageManager>,
        job_manager: Arc<JobManager>,
        scraper: Arc<dyn HtmlScraper>,
        id_gen: Arc<dyn IdGen>,
        clock: Arc<dyn Clock>,
        defaults: CrawlerDefaults,
    ) -> Self {
        Self {
            storage,
            job_manager,
            scraper,
            id_gen,
            clock,
            defaults,
        }
    }

    fn resolve_source(&self, job: &Job) -> Result<SourceConfig> {
        let snapshot = job
            .metadata
            .source_config_snapshot
            .clone()
            .ok_or_else(|| EngineError::Other(anyhow::anyhow!("crawler job {} has no source_config_snapshot", job.id)))?;
        serde_json::from_value(snapshot)
            .map_err(|err| EngineError::Other(anyhow::anyhow!("malformed source_config_snapshot on job {}: {err}", job.id)))
    }

    fn build_options(&self, source: &SourceConfig) -> Result<ScrapeOptions> {
        let mut options = ScrapeOptions {
            detail_level: source.crawl_config.detail_level,
            user_agent: self.defaults.user_agent.clone(),
            timeout: Duration::from_secs(self.defaults.request_timeout_secs.max(1)),
            max_body_size: self.defaults.max_body_size_bytes,
            only_main_content: self.defaults.only_main_content,
            include_metadata: self.defaults.include_metadata,
            include_links: self.defaults.include_links,
            output_format: self.defaults.output_format.into(),
            ..ScrapeOptions::default()
        };

        if let Some(auth_id) = &source.auth_id {
            let auth = self.storage.auth.resolve(auth_id)?;
            options = options.with_auth(&auth);
        }

        Ok(options)
    }
}

#[async_trait]
impl JobExecutor for CrawlerExecutor {
    async fn execute(&self, job: &Job, cancel: CancelToken) -> Result<()> {
        let source = self.resolve_source(job)?;
        let scrape_options = self.build_options(&source)?;

        let run_config = CrawlRunConfig {
            max_depth: source.crawl_config.max_depth,
            concurrency: source.crawl_config.concurrency,
            follow_links: source.crawl_config.follow_links,
            filters: source.filters.clone(),
            same_host_only: true,
            max_retries: 2,
            scrape_options,
        };

        let sink: Arc<dyn CrawlSink> = Arc::new(EngineCrawlSink {
            storage: Arc::clone(&self.storage),
            job_manager: Arc::clone(&self.job_manager),
            id_gen: Arc::clone(&self.id_gen),
            clock: Arc::clone(&self.clock),
            source,
        });

        let engine = CrawlerEngine::new(Arc::clone(&self.scraper), sink);
        let outcome = engine
            .run(job.id.clone(), &job_base_url(job)?, run_config, cancel)
            .await?;

        match outcome {
            CrawlOutcome::Completed { .. } => Ok(()),
            CrawlOutcome::Cancelled { .. } => Err(CrawlError::Cancelled.into()),
            CrawlOutcome::Failed { reason } => Err(EngineError::Other(anyhow::anyhow!(reason))),
        }
    }
}

fn job_base_url(job: &Job) -> Result<String> {
    let snapshot = job
        .metadata
        .source_config_snapshot
        .as_ref()
        .ok_or_else(|| EngineError::Other(anyhow::anyhow!("crawler job {} has no source_config_snapshot", job.id)))?;
    snapshot
        .get("base_url")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::Other(anyhow::anyhow!("crawler job {} source snapshot has no base_url", job.id)))
}

/// Bridges the crawler crate's persistence-agnostic worker pool to
/// storage and the job manager: every scraped page is transformed and
/// upserted here, and every per-URL child job is created/completed/failed
/// through [`JobManager`] so the bus sees the same events an on-demand
/// crawl would produce.
struct EngineCrawlSink {
    storage: Arc<StorageManager>,
    job_manager: Arc<JobManager>,
    id_gen: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
    source: SourceConfig,
}

#[async_trait]
impl CrawlSink for EngineCrawlSink {
    async fn spawn_child_job(&self, parent: &JobId, _url: &str) -> anyhow::Result<JobId> {
        let job = self.job_manager.create_job(JobSpec {
            definition_id: None,
            parent_id: Some(parent.clone()),
            kind: JobKind::Crawler,
            metadata: JobMetadata::default(),
        })?;
        Ok(job.id)
    }

    async fn mark_child_completed(&self, child: &JobId) -> anyhow::Result<()> {
        self.job_manager.update_job_status(child, JobStatus::Completed, None)?;
        Ok(())
    }

    async fn mark_child_failed(&self, child: &JobId, error: &str) -> anyhow::Result<()> {
        self.job_manager
            .update_job_status(child, JobStatus::Failed, Some(error.to_string()))?;
        Ok(())
    }

    async fn record_scrape(&self, parent: &JobId, page: ScrapedPage) -> anyhow::Result<()> {
        let now = self.clock.now();
        let doc = transformer::transform(&page.result, &page.url, &self.source, self.id_gen.as_ref(), now);
        let saved = self.storage.documents.upsert(doc)?;
        self.job_manager.increment_document_count(parent)?;

        let is_new = saved.created_at == saved.updated_at;
        let event = if is_new {
            Event::DocumentSaved {
                id: saved.id,
                source_type: saved.source_type,
                source_id: saved.source_id,
                detail_level: saved.detail_level,
            }
        } else {
            Event::DocumentUpdated {
                id: saved.id,
                source_type: saved.source_type,
                source_id: saved.source_id,
                detail_level: saved.detail_level,
            }
        };
        self.job_manager.bus().publish(event);
        Ok(())
    }

    async fn heartbeat(&self, job: &JobId) -> anyhow::Result<()> {
        self.job_manager.update_job_heartbeat(job)?;
        Ok(())
    }

    async fn publish_progress(&self, job: &JobId, visited: u64, queued: u64) -> anyhow::Result<()> {
        self.job_manager.bus().publish(Event::JobProgress {
            id: job.clone(),
            visited_count: visited,
            queued_count: queued,
            progress_text: None,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "crawler_tests.rs"]
mod tests;
