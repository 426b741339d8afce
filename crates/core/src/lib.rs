#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-core: domain types, identifiers, and the in-process event bus
//! shared by every other Quaero crate. Nothing here touches SQLite,
//! HTTP, or the filesystem — those live in `quaero-storage`,
//! `quaero-adapters`, and `quaero-server`.

pub mod auth;
pub mod bus;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod id;
pub mod job;
pub mod seed;
pub mod source;
pub mod url_queue;

pub use auth::{AuthSnapshot, Cookie};
pub use bus::{AsyncSubscription, EventBus, EventSubscriber};
pub use cancel::CancelToken;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    Config, CrawlerDefaults, DefaultJobDefinition, LlmConfig, OutputFormat, RateLimitConfig,
    ServerConfig,
};
pub use document::{merge_metadata, DetailLevel, Document, DocumentId, SourceType};
pub use error::InvariantError;
pub use event::{Event, LogLevel};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{
    ErrorTolerance, Job, JobDefinition, JobDefinitionId, JobId, JobKind, JobMetadata,
    JobProgress, JobSpec, JobStatus, StepStats, MIN_SCHEDULE_PERIOD_SECS,
};
pub use seed::plan_seed;
pub use source::{AuthId, CrawlConfig, LinkFilters, SourceConfig, SourceId};
pub use url_queue::{canonicalize, UrlQueueItem};
