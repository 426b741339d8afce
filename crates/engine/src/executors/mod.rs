//! Job-kind-specific work. Each executor implements [`JobExecutor`] and
//! is looked up by [`crate::dispatch::Dispatcher`] from a job's `kind` —
//! none of them ever write a job's terminal status themselves, that's
//! the dispatcher's job via [`crate::job_manager::JobManager`].

use async_trait::async_trait;
use quaero_core::{CancelToken, Job};

use crate::error::Result;

pub mod crawler;
pub mod maintenance;
pub mod parent_aggregator;
pub mod summariser;

pub use crawler::CrawlerExecutor;
pub use maintenance::MaintenanceExecutor;
pub use parent_aggregator::ParentAggregator;
pub use summariser::SummariserExecutor;

#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job, cancel: CancelToken) -> Result<()>;
}
