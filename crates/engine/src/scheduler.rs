//! Cron-like registration, auto-start, orphan/stale detection, and
//! graceful shutdown. The scheduler never runs a job itself — it turns
//! a due [`JobDefinition`] into one or more `pending` jobs and hands
//! them to the [`Dispatcher`], then gets out of the way.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cron::Schedule;
use quaero_core::{
    Clock, Event, EventSubscriber, Job, JobDefinition, JobDefinitionId, JobKind, JobMetadata, JobSpec,
    JobStatus, MIN_SCHEDULE_PERIOD_SECS,
};
use quaero_storage::StorageManager;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::dispatch::Dispatcher;
use crate::error::{EngineError, Result};
use crate::job_manager::JobManager;

/// Parse a schedule expression against the documented five-field cron
/// syntax. The `cron` crate itself requires six fields (seconds-first),
/// so a leading `"0 "` is prepended before delegating to it — this
/// keeps the external contract five-field while still relying on the
/// real upstream parser rather than a hand-rolled one.
fn parse_schedule(expr: &str) -> Result<Schedule> {
    let six_field = format!("0 {expr}");
    Schedule::from_str(&six_field).map_err(|err| EngineError::InvalidSchedule(expr.to_string(), err.to_string()))
}

/// Parse and additionally reject schedules whose firing period is
/// below [`MIN_SCHEDULE_PERIOD_SECS`] — protects against a typo'd cron
/// expression hammering the crawler every few seconds.
fn validate_schedule(expr: &str, now: DateTime<Utc>) -> Result<Schedule> {
    let schedule = parse_schedule(expr)?;
    let mut upcoming = schedule.after(&now);
    let first = upcoming
        .next()
        .ok_or_else(|| EngineError::InvalidSchedule(expr.to_string(), "schedule never fires".to_string()))?;
    let second = upcoming
        .next()
        .ok_or_else(|| EngineError::InvalidSchedule(expr.to_string(), "schedule never fires".to_string()))?;
    let period = (second - first).num_seconds().max(0) as u64;
    if period < MIN_SCHEDULE_PERIOD_SECS {
        return Err(EngineError::InvalidSchedule(
            expr.to_string(),
            format!("period of {period}s is below the minimum of {MIN_SCHEDULE_PERIOD_SECS}s"),
        ));
    }
    Ok(schedule)
}

pub struct Scheduler {
    job_manager: Arc<JobManager>,
    storage: Arc<StorageManager>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
    last_tick: parking_lot::Mutex<HashMap<JobDefinitionId, DateTime<Utc>>>,
    /// Held for the duration of a scheduled job's run so only one fires
    /// at a time. On-demand dispatch (a user hitting the API) never
    /// touches this gate — see [`Scheduler::dispatch_on_demand`].
    schedule_gate: Arc<tokio::sync::Mutex<()>>,
}

impl Scheduler {
    pub fn new(
        job_manager: Arc<JobManager>,
        storage: Arc<StorageManager>,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            job_manager: Arc::clone(&job_manager),
            storage,
            dispatcher,
            clock,
            last_tick: parking_lot::Mutex::new(HashMap::new()),
            schedule_gate: Arc::new(tokio::sync::Mutex::new(())),
        });
        job_manager.bus().subscribe_sync(Arc::new(PostJobChainer {
            scheduler: Arc::clone(&scheduler),
        }));
        scheduler
    }

    /// Validate a schedule expression without registering anything —
    /// used by the definitions API to reject a bad cron string at
    /// write time rather than at the next tick.
    pub fn validate_schedule(&self, expr: &str) -> Result<()> {
        validate_schedule(expr, self.clock.now()).map(|_| ())
    }

    /// Any job still `running` at startup belongs to a process that no
    /// longer exists — fail it rather than let it sit forever.
    pub fn recover_orphaned_jobs(&self) -> Result<usize> {
        let running = self.storage.jobs.get_jobs_by_status(JobStatus::Running)?;
        let count = running.len();
        for job in running {
            self.job_manager
                .update_job_status(&job.id, JobStatus::Failed, Some("orphaned at startup".to_string()))?;
        }
        Ok(count)
    }

    /// Fail any job whose heartbeat hasn't been touched within
    /// `threshold_minutes` — a worker that died mid-crawl without
    /// crashing the whole process.
    pub fn sweep_stale_jobs(&self, threshold_minutes: i64) -> Result<usize> {
        let stale = self.storage.jobs.get_stale_jobs(threshold_minutes)?;
        let count = stale.len();
        for job in stale {
            self.job_manager.update_job_status(
                &job.id,
                JobStatus::Failed,
                Some("heartbeat exceeded staleness threshold".to_string()),
            )?;
        }
        Ok(count)
    }

    /// Dispatch every enabled definition with `auto_start` set, once,
    /// at startup — ahead of the first tick.
    pub fn run_auto_start(&self) -> Result<()> {
        for def in self.storage.job_definitions.list()? {
            if def.enabled && def.auto_start {
                self.dispatch_definition(&def)?;
            }
        }
        Ok(())
    }

    /// Check every enabled, scheduled definition for due-ness and
    /// dispatch the ones that are. Tracks the last fired occurrence
    /// in memory per definition; a definition never ticked before is
    /// treated as due only once its schedule's next occurrence after
    /// a year ago has already passed (i.e. on the very next tick that
    /// observes it).
    pub fn tick_once(&self) -> Result<()> {
        let now = self.clock.now();
        for def in self.storage.job_definitions.list()? {
            if !def.enabled {
                continue;
            }
            let Some(expr) = &def.schedule else { continue };
            let schedule = match parse_schedule(expr) {
                Ok(schedule) => schedule,
                Err(err) => {
                    tracing::warn!(definition = %def.name, error = %err, "skipping definition with an invalid schedule");
                    continue;
                }
            };
            if self.is_due(&def.id, &schedule, now) {
                self.dispatch_definition(&def)?;
            }
        }
        Ok(())
    }

    fn is_due(&self, def_id: &JobDefinitionId, schedule: &Schedule, now: DateTime<Utc>) -> bool {
        let mut last_tick = self.last_tick.lock();
        let baseline = last_tick
            .get(def_id)
            .copied()
            .unwrap_or_else(|| now - ChronoDuration::days(365));
        let due = schedule.after(&baseline).next().is_some_and(|next| next <= now);
        if due {
            last_tick.insert(def_id.clone(), now);
        }
        due
    }

    /// Dispatch a definition's `pre_jobs` (fire-and-forget, not awaited
    /// by the owning job) and then the definition itself, returning the
    /// job(s) created for `def` (not its `pre_jobs`) so a caller can
    /// report back the id(s) it just started. This is the scheduled
    /// path: every job it spawns is serialised through `schedule_gate`,
    /// so only one scheduled job runs at a time.
    pub fn dispatch_definition(&self, def: &JobDefinition) -> Result<Vec<Job>> {
        for pre_id in &def.pre_jobs {
            match self.storage.job_definitions.get(pre_id) {
                Ok(pre_def) => {
                    self.dispatch_root_job(&pre_def, true)?;
                }
                Err(err) => tracing::warn!(pre_job = %pre_id, error = %err, "pre_job definition not found"),
            }
        }
        self.dispatch_root_job(def, true)
    }

    /// Dispatch a definition immediately, bypassing `schedule_gate` —
    /// for a user-initiated run that shouldn't have to wait behind a
    /// cron job. Used by the on-demand jobs API.
    pub fn dispatch_on_demand(&self, def: &JobDefinition) -> Result<Vec<Job>> {
        self.dispatch_root_job(def, false)
    }

    /// Dispatch a single ad-hoc crawler job for one source, not tied to
    /// any job definition — the on-demand jobs API's `{source_id, type}`
    /// form. Never gated by `schedule_gate`, same as every other
    /// on-demand path.
    pub fn dispatch_ad_hoc_source(&self, source_id: &quaero_core::SourceId, timeout: StdDuration) -> Result<Job> {
        let job = self.create_crawler_job(None, None, source_id)?;
        self.spawn(job.clone(), timeout, false);
        Ok(job)
    }

    /// Build the job(s) a definition's `sources` fan out to and hand
    /// each to the dispatcher in the background: zero sources is a
    /// single job carrying no source snapshot, one source is a single
    /// crawler job snapshotting that source, and more than one is an
    /// `aggregator` parent plus one crawler child per source.
    fn dispatch_root_job(&self, def: &JobDefinition, gated: bool) -> Result<Vec<Job>> {
        let timeout = StdDuration::from_secs(def.timeout_secs);
        let jobs = self.build_jobs_for_sources(def)?;
        for job in &jobs {
            self.spawn(job.clone(), timeout, gated);
        }
        Ok(jobs)
    }

    fn build_jobs_for_sources(&self, def: &JobDefinition) -> Result<Vec<Job>> {
        match def.sources.len() {
            0 => {
                let job = self.job_manager.create_job(JobSpec {
                    definition_id: Some(def.id.clone()),
                    parent_id: None,
                    kind: def.kind,
                    metadata: JobMetadata::default(),
                })?;
                Ok(vec![job])
            }
            1 => {
                let job = self.create_crawler_job(Some(def.id.clone()), None, &def.sources[0])?;
                Ok(vec![job])
            }
            _ => {
                let parent = self.job_manager.create_job(JobSpec {
                    definition_id: Some(def.id.clone()),
                    parent_id: None,
                    kind: JobKind::Aggregator,
                    metadata: JobMetadata::default(),
                })?;
                let mut jobs = Vec::with_capacity(def.sources.len() + 1);
                for source_id in &def.sources {
                    let child = self.create_crawler_job(Some(def.id.clone()), Some(parent.id.clone()), source_id)?;
                    jobs.push(child);
                }
                jobs.push(parent);
                Ok(jobs)
            }
        }
    }

    fn create_crawler_job(
        &self,
        definition_id: Option<JobDefinitionId>,
        parent_id: Option<quaero_core::JobId>,
        source_id: &quaero_core::SourceId,
    ) -> Result<Job> {
        let source = self.storage.sources.get(source_id)?;
        let snapshot = serde_json::to_value(&source).map_err(|err| EngineError::Other(anyhow::anyhow!(err)))?;
        self.job_manager.create_job(JobSpec {
            definition_id,
            parent_id,
            kind: JobKind::Crawler,
            metadata: JobMetadata {
                source_config_snapshot: Some(snapshot),
                ..Default::default()
            },
        })
    }

    fn spawn(&self, job: Job, timeout: StdDuration, gated: bool) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let gate = gated.then(|| Arc::clone(&self.schedule_gate));
        tokio::spawn(async move {
            let _permit = match &gate {
                Some(gate) => Some(gate.lock().await),
                None => None,
            };
            if let Err(err) = dispatcher.run_to_completion(job, timeout).await {
                tracing::error!(error = %err, "job dispatch failed");
            }
        });
    }

    /// Cancel every in-flight job and wait up to 30s (wall clock, not
    /// the injected domain clock) for them to reach a terminal state.
    pub async fn graceful_shutdown(&self) {
        self.dispatcher.cancel_all();
        let deadline = tokio::time::Instant::now() + StdDuration::from_secs(30);
        while self.dispatcher.active_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
        }
    }
}

/// Reacts to a root job (no `parent_id`) completing successfully by
/// dispatching its definition's `post_jobs`.
struct PostJobChainer {
    scheduler: Arc<Scheduler>,
}

impl EventSubscriber for PostJobChainer {
    fn on_event(&self, event: &Event) {
        let Event::JobCompleted {
            id,
            parent_id: None,
            status: JobStatus::Completed,
            ..
        } = event
        else {
            return;
        };

        let job = match self.scheduler.storage.jobs.get(id) {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(job_id = %id, error = %err, "failed to reload completed job for post-job chaining");
                return;
            }
        };

        let Some(definition_id) = &job.definition_id else {
            return;
        };

        let definition = match self.scheduler.storage.job_definitions.get(definition_id) {
            Ok(def) => def,
            Err(err) => {
                tracing::warn!(definition_id = %definition_id, error = %err, "failed to load definition for post-job chaining");
                return;
            }
        };

        for post_id in &definition.post_jobs {
            match self.scheduler.storage.job_definitions.get(post_id) {
                Ok(post_def) => {
                    if let Err(err) = self.scheduler.dispatch_root_job(&post_def, true) {
                        tracing::warn!(post_job = %post_id, error = %err, "failed to dispatch post_job");
                    }
                }
                Err(err) => tracing::warn!(post_job = %post_id, error = %err, "post_job definition not found"),
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
