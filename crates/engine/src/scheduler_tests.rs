use super::*;
use quaero_core::{
    CrawlConfig, EventBus, FakeClock, IdGen, LinkFilters, SequentialIdGen, SourceConfig, SourceId, SourceType,
    UuidIdGen,
};
use quaero_storage::StorageManager;

fn job_count(storage: &StorageManager) -> i64 {
    storage
        .pool()
        .get()
        .expect("conn")
        .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
        .expect("count")
}

fn job_count_for_definition(storage: &StorageManager, definition_id: &JobDefinitionId) -> i64 {
    storage
        .pool()
        .get()
        .expect("conn")
        .query_row(
            "SELECT COUNT(*) FROM jobs WHERE definition_id = ?1",
            [definition_id.as_str()],
            |row| row.get(0),
        )
        .expect("count")
}

fn scheduler_with(clock: Arc<FakeClock>) -> (Arc<Scheduler>, Arc<JobManager>, Arc<StorageManager>) {
    let path = tempfile::NamedTempFile::new().expect("tempfile");
    let clock_dyn: Arc<dyn Clock> = clock;
    let storage = Arc::new(StorageManager::open(path.path().to_str().expect("utf8 path"), Arc::clone(&clock_dyn)).expect("open storage"));
    std::mem::forget(path);
    let bus = EventBus::new();
    let job_manager = Arc::new(JobManager::new(Arc::clone(&storage), bus, Arc::new(UuidIdGen)));
    let executor: Arc<dyn crate::executors::JobExecutor> = Arc::new(NoopExecutor);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&job_manager),
        Arc::clone(&executor),
        Arc::clone(&executor),
        executor,
    ));
    let scheduler = Scheduler::new(Arc::clone(&job_manager), Arc::clone(&storage), dispatcher, clock_dyn);
    (scheduler, job_manager, storage)
}

struct NoopExecutor;

#[async_trait::async_trait]
impl crate::executors::JobExecutor for NoopExecutor {
    async fn execute(&self, _job: &Job, _cancel: quaero_core::CancelToken) -> Result<()> {
        Ok(())
    }
}

fn definition(id_gen: &SequentialIdGen, name: &str) -> JobDefinition {
    JobDefinition {
        id: JobDefinitionId::new(id_gen.next()),
        name: name.to_string(),
        kind: JobKind::Crawler,
        description: String::new(),
        sources: Vec::new(),
        steps: Vec::new(),
        schedule: None,
        timeout_secs: 60,
        enabled: true,
        auto_start: false,
        config: serde_json::Map::new(),
        pre_jobs: Vec::new(),
        post_jobs: Vec::new(),
        error_tolerance: Default::default(),
        config_error: None,
    }
}

fn source(id: &str) -> SourceConfig {
    SourceConfig {
        id: SourceId::new(id),
        source_type: SourceType::Generic,
        name: "Test Source".into(),
        base_url: "http://example.test/".into(),
        enabled: true,
        auth_id: None,
        crawl_config: CrawlConfig::default(),
        filters: LinkFilters::default(),
    }
}

#[test]
fn validate_schedule_accepts_a_five_field_expression() {
    let (scheduler, _manager, _storage) = scheduler_with(Arc::new(FakeClock::new()));
    scheduler.validate_schedule("*/10 * * * *").expect("valid schedule");
}

#[test]
fn validate_schedule_rejects_a_period_below_the_minimum() {
    let (scheduler, _manager, _storage) = scheduler_with(Arc::new(FakeClock::new()));
    let err = scheduler.validate_schedule("* * * * *").expect_err("period too short");
    assert!(matches!(err, EngineError::InvalidSchedule(_, _)));
}

#[test]
fn validate_schedule_rejects_garbage() {
    let (scheduler, _manager, _storage) = scheduler_with(Arc::new(FakeClock::new()));
    let err = scheduler.validate_schedule("not a cron").expect_err("garbage schedule");
    assert!(matches!(err, EngineError::InvalidSchedule(_, _)));
}

#[test]
fn dispatch_definition_with_no_sources_creates_a_single_job() {
    let (scheduler, _manager, _storage) = scheduler_with(Arc::new(FakeClock::new()));
    let id_gen = SequentialIdGen::new("def");
    let def = definition(&id_gen, "no-sources");

    let jobs = scheduler.dispatch_definition(&def).expect("dispatch");

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind, JobKind::Crawler);
    assert!(jobs[0].parent_id.is_none());
}

#[test]
fn dispatch_definition_with_multiple_sources_creates_an_aggregator_and_children() {
    let (scheduler, _manager, storage) = scheduler_with(Arc::new(FakeClock::new()));
    storage.sources.create(source("s1")).expect("create source 1");
    storage.sources.create(source("s2")).expect("create source 2");

    let id_gen = SequentialIdGen::new("def");
    let mut def = definition(&id_gen, "two-sources");
    def.sources = vec![SourceId::new("s1"), SourceId::new("s2")];

    let jobs = scheduler.dispatch_definition(&def).expect("dispatch");

    assert_eq!(jobs.len(), 3);
    let aggregator = jobs.iter().find(|j| j.kind == JobKind::Aggregator).expect("aggregator present");
    let children: Vec<_> = jobs.iter().filter(|j| j.kind == JobKind::Crawler).collect();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.parent_id.as_ref() == Some(&aggregator.id)));
}

#[test]
fn tick_once_dispatches_a_due_definition_exactly_once() {
    let clock = Arc::new(FakeClock::new());
    let (scheduler, _manager, storage) = scheduler_with(Arc::clone(&clock));
    let id_gen = SequentialIdGen::new("def");
    let mut def = definition(&id_gen, "nightly");
    def.schedule = Some("*/10 * * * *".to_string());
    storage.job_definitions.create(def).expect("create definition");

    scheduler.tick_once().expect("first tick");
    assert_eq!(job_count(&storage), 1);

    scheduler.tick_once().expect("second tick at the same instant");
    assert_eq!(job_count(&storage), 1, "a definition already ticked at this instant should not fire again");
}

#[test]
fn run_auto_start_dispatches_enabled_auto_start_definitions() {
    let (scheduler, _manager, storage) = scheduler_with(Arc::new(FakeClock::new()));
    let id_gen = SequentialIdGen::new("def");
    let mut started = definition(&id_gen, "auto");
    started.auto_start = true;
    storage.job_definitions.create(started).expect("create auto_start definition");

    let mut not_started = definition(&id_gen, "manual");
    not_started.auto_start = false;
    storage.job_definitions.create(not_started).expect("create manual definition");

    scheduler.run_auto_start().expect("run auto start");

    assert_eq!(job_count(&storage), 1);
}

#[test]
fn recover_orphaned_jobs_fails_every_running_job() {
    let (scheduler, manager, _storage) = scheduler_with(Arc::new(FakeClock::new()));
    let job = manager
        .create_job(quaero_core::JobSpec {
            definition_id: None,
            parent_id: None,
            kind: JobKind::Maintenance,
            metadata: quaero_core::JobMetadata::default(),
        })
        .expect("create job");
    manager.update_job_status(&job.id, JobStatus::Running, None).expect("mark running");

    let count = scheduler.recover_orphaned_jobs().expect("recover");

    assert_eq!(count, 1);
    let reloaded = manager.storage().jobs.get(&job.id).expect("reload");
    assert_eq!(reloaded.status, JobStatus::Failed);
}

#[test]
fn sweep_stale_jobs_fails_jobs_past_the_heartbeat_threshold() {
    let clock = Arc::new(FakeClock::new());
    let (scheduler, manager, _storage) = scheduler_with(Arc::clone(&clock));
    let job = manager
        .create_job(quaero_core::JobSpec {
            definition_id: None,
            parent_id: None,
            kind: JobKind::Maintenance,
            metadata: quaero_core::JobMetadata::default(),
        })
        .expect("create job");
    manager.update_job_status(&job.id, JobStatus::Running, None).expect("mark running");

    clock.advance(ChronoDuration::minutes(120));

    let count = scheduler.sweep_stale_jobs(30).expect("sweep");

    assert_eq!(count, 1);
    let reloaded = manager.storage().jobs.get(&job.id).expect("reload");
    assert_eq!(reloaded.status, JobStatus::Failed);
}

#[tokio::test]
async fn completing_a_root_job_dispatches_its_post_jobs() {
    let (scheduler, manager, storage) = scheduler_with(Arc::new(FakeClock::new()));
    let id_gen = SequentialIdGen::new("def");

    let post_def = definition(&id_gen, "post");
    let post_def = storage.job_definitions.create(post_def).expect("create post definition");

    let mut root_def = definition(&id_gen, "root");
    root_def.post_jobs = vec![post_def.id.clone()];
    let root_def = storage.job_definitions.create(root_def).expect("create root definition");

    let job = manager
        .create_job(quaero_core::JobSpec {
            definition_id: Some(root_def.id.clone()),
            parent_id: None,
            kind: JobKind::Crawler,
            metadata: quaero_core::JobMetadata::default(),
        })
        .expect("create job");

    manager
        .update_job_status(&job.id, JobStatus::Completed, None)
        .expect("complete job");

    // post-job dispatch is spawned onto the runtime by the subscriber; give it a tick.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert_eq!(
        job_count_for_definition(&storage, &post_def.id),
        1,
        "expected a job dispatched for the post_jobs definition"
    );
}

#[test]
fn dispatch_ad_hoc_source_creates_an_untracked_crawler_job() {
    let (scheduler, _manager, storage) = scheduler_with(Arc::new(FakeClock::new()));
    storage.sources.create(source("s1")).expect("create source");

    let job = scheduler
        .dispatch_ad_hoc_source(&SourceId::new("s1"), std::time::Duration::from_secs(60))
        .expect("dispatch ad hoc job");

    assert_eq!(job.kind, JobKind::Crawler);
    assert!(job.definition_id.is_none());
    assert!(job.parent_id.is_none());
    assert_eq!(job_count(&storage), 1);
}
