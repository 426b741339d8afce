//! Bounded worker pool for one crawl job: dequeue, rate-limit, scrape,
//! retry, transform (via the sink), follow links, repeat until the
//! queue drains or the job is cancelled.

use quaero_adapters::{HtmlScraper, ScrapeOptions, ScrapeResult};
use quaero_core::{canonicalize, CancelToken, JobId, LinkFilters, UrlQueueItem};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use url::Url;

use crate::error::{CrawlError, Result};
use crate::sink::{CrawlSink, ScrapedPage};

/// Per-job crawl parameters, distilled from `SourceConfig.crawl_config`
/// plus `SourceConfig.filters` by the caller (the crawler executor).
#[derive(Debug, Clone)]
pub struct CrawlRunConfig {
    pub max_depth: u32,
    pub concurrency: u32,
    pub follow_links: bool,
    pub filters: LinkFilters,
    /// Restrict followed links to the seed's host — the spec's
    /// "same-host default".
    pub same_host_only: bool,
    pub max_retries: u32,
    pub scrape_options: ScrapeOptions,
}

impl Default for CrawlRunConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            concurrency: 4,
            follow_links: true,
            filters: LinkFilters::default(),
            same_host_only: true,
            max_retries: 2,
            scrape_options: ScrapeOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    Completed { visited: u64, documents: u64 },
    Cancelled { visited: u64 },
    Failed { reason: String },
}

struct QueueState {
    queue: VecDeque<UrlQueueItem>,
    visited: HashSet<String>,
    in_flight: u32,
}

pub struct CrawlerEngine {
    scraper: Arc<dyn HtmlScraper>,
    sink: Arc<dyn CrawlSink>,
}

impl CrawlerEngine {
    pub fn new(scraper: Arc<dyn HtmlScraper>, sink: Arc<dyn CrawlSink>) -> Self {
        Self { scraper, sink }
    }

    pub async fn run(
        &self,
        job_id: JobId,
        seed_url: &str,
        config: CrawlRunConfig,
        cancel: CancelToken,
    ) -> Result<CrawlOutcome> {
        if seed_url.trim().is_empty() {
            return Err(CrawlError::EmptySeed);
        }

        let seed_host = Url::parse(seed_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let canonical_seed = canonicalize(seed_url);
        let state = Arc::new(Mutex::new(QueueState {
            queue: VecDeque::from([UrlQueueItem::seed(seed_url)]),
            visited: HashSet::from([canonical_seed]),
            in_flight: 0,
        }));
        let notify = Arc::new(Notify::new());
        let documents = Arc::new(AtomicU64::new(0));
        let visited_count = Arc::new(AtomicU64::new(0));

        let worker_count = config.concurrency.max(1);
        let mut handles = Vec::with_capacity(worker_count as usize);

        for worker_index in 0..worker_count {
            let worker = Worker {
                job_id: job_id.clone(),
                seed_host: seed_host.clone(),
                config: config.clone(),
                state: Arc::clone(&state),
                notify: Arc::clone(&notify),
                documents: Arc::clone(&documents),
                visited_count: Arc::clone(&visited_count),
                scraper: Arc::clone(&self.scraper),
                sink: Arc::clone(&self.sink),
                cancel: cancel.clone(),
            };
            handles.push(tokio::spawn(async move {
                worker.run(worker_index).await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        let outcome = if cancel.is_cancelled() {
            CrawlOutcome::Cancelled {
                visited: visited_count.load(Ordering::Relaxed),
            }
        } else {
            CrawlOutcome::Completed {
                visited: visited_count.load(Ordering::Relaxed),
                documents: documents.load(Ordering::Relaxed),
            }
        };

        Ok(outcome)
    }
}

struct Worker {
    job_id: JobId,
    seed_host: String,
    config: CrawlRunConfig,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    documents: Arc<AtomicU64>,
    visited_count: Arc<AtomicU64>,
    scraper: Arc<dyn HtmlScraper>,
    sink: Arc<dyn CrawlSink>,
    cancel: CancelToken,
}

impl Worker {
    async fn run(&self, worker_index: u32) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let item = match self.next_item().await {
                Some(item) => item,
                None => return,
            };

            tracing::debug!(job_id = %self.job_id, worker = worker_index, url = %item.url, "dequeued url");

            let outcome = self.process(&item).await;

            {
                let mut state = self.state.lock().await;
                state.in_flight = state.in_flight.saturating_sub(1);
            }
            self.notify.notify_waiters();

            if let Err(err) = outcome {
                tracing::warn!(job_id = %self.job_id, url = %item.url, error = %err, "page processing failed");
            }

            let _ = self
                .sink
                .publish_progress(
                    &self.job_id,
                    self.visited_count.load(Ordering::Relaxed),
                    self.queue_len().await,
                )
                .await;
            let _ = self.sink.heartbeat(&self.job_id).await;
        }
    }

    async fn queue_len(&self) -> u64 {
        self.state.lock().await.queue.len() as u64
    }

    /// Pop the next item, or wait for one to appear, or return `None`
    /// once the queue is empty and no worker is still processing an
    /// item (the pool-wide completion condition).
    async fn next_item(&self) -> Option<UrlQueueItem> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(item) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(item);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }
            tokio::select! {
                _ = notified => {}
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            }
        }
    }

    async fn process(&self, item: &UrlQueueItem) -> Result<()> {
        let result = self.scrape_with_retries(&item.url).await;
        self.visited_count.fetch_add(1, Ordering::Relaxed);

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                let child = self
                    .sink
                    .spawn_child_job(&self.job_id, &item.url)
                    .await
                    .map_err(CrawlError::Sink)?;
                self.sink
                    .mark_child_failed(&child, &err.to_string())
                    .await
                    .map_err(CrawlError::Sink)?;
                return Err(err.into());
            }
        };

        let child = self
            .sink
            .spawn_child_job(&self.job_id, &item.url)
            .await
            .map_err(CrawlError::Sink)?;

        if (200..300).contains(&result.status_code) {
            self.enqueue_links(item, &result).await;
            self.documents.fetch_add(1, Ordering::Relaxed);
            self.sink
                .record_scrape(
                    &self.job_id,
                    ScrapedPage {
                        url: item.url.clone(),
                        depth: item.depth,
                        discovered_by: item.discovered_by.clone(),
                        result,
                    },
                )
                .await
                .map_err(CrawlError::Sink)?;
            self.sink
                .mark_child_completed(&child)
                .await
                .map_err(CrawlError::Sink)?;
        } else {
            self.sink
                .mark_child_failed(&child, &format!("http status {}", result.status_code))
                .await
                .map_err(CrawlError::Sink)?;
        }

        Ok(())
    }

    async fn scrape_with_retries(&self, url: &str) -> std::result::Result<ScrapeResult, quaero_adapters::ScrapeError> {
        let mut attempt = 0;
        loop {
            match self.scraper.scrape(url, &self.config.scrape_options).await {
                Ok(result) if result.status_code >= 500 && attempt < self.config.max_retries => {
                    attempt += 1;
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Ok(result) => return Ok(result),
                Err(err) if attempt < self.config.max_retries && is_transient(&err) => {
                    attempt += 1;
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn enqueue_links(&self, item: &UrlQueueItem, result: &ScrapeResult) {
        if !self.config.follow_links || item.depth + 1 > self.config.max_depth {
            return;
        }

        let mut state = self.state.lock().await;
        for link in &result.links {
            if !self.link_passes_filters(link) {
                continue;
            }
            let canonical = canonicalize(link);
            if state.visited.contains(&canonical) {
                continue;
            }
            state.visited.insert(canonical);
            state.queue.push_back(UrlQueueItem {
                url: link.clone(),
                depth: item.depth + 1,
                discovered_by: Some(item.url.clone()),
                retries: 0,
            });
        }
        drop(state);
        self.notify.notify_waiters();
    }

    fn link_passes_filters(&self, link: &str) -> bool {
        if self.config.same_host_only {
            let same_host = Url::parse(link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .map(|host| host == self.seed_host)
                .unwrap_or(false);
            if !same_host {
                return false;
            }
        }
        self.config.filters.allows(link)
    }
}

fn is_transient(err: &quaero_adapters::ScrapeError) -> bool {
    matches!(
        err,
        quaero_adapters::ScrapeError::Timeout { .. } | quaero_adapters::ScrapeError::Network { .. }
    )
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * 2u64.pow(attempt.min(5)))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
