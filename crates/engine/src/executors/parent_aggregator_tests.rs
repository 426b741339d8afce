use super::*;
use quaero_core::{Clock, EventBus, FakeClock, JobKind, JobMetadata, JobSpec, JobStatus, UuidIdGen};
use quaero_storage::StorageManager;

fn job_manager() -> Arc<JobManager> {
    let path = tempfile::NamedTempFile::new().expect("tempfile");
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let storage = Arc::new(StorageManager::open(path.path().to_str().expect("utf8 path"), clock).expect("open storage"));
    std::mem::forget(path);
    Arc::new(JobManager::new(storage, EventBus::new(), Arc::new(UuidIdGen)))
}

#[test]
fn refreshes_parent_step_stats_when_a_child_changes_status() {
    let manager = job_manager();
    let parent = manager
        .create_job(JobSpec {
            definition_id: None,
            parent_id: None,
            kind: JobKind::Aggregator,
            metadata: JobMetadata::default(),
        })
        .expect("create parent");
    let child = manager
        .create_job(JobSpec {
            definition_id: None,
            parent_id: Some(parent.id.clone()),
            kind: JobKind::Crawler,
            metadata: JobMetadata::default(),
        })
        .expect("create child");

    manager.bus().subscribe_sync(Arc::new(ParentAggregator::new(Arc::clone(&manager))));

    manager
        .update_job_status(&child.id, JobStatus::Running, None)
        .expect("child to running");
    manager
        .update_job_status(&child.id, JobStatus::Completed, None)
        .expect("child to completed");

    let refreshed = manager.storage().jobs.get(&parent.id).expect("reload parent");
    let stats = refreshed.metadata.step_stats.expect("step stats present");
    assert_eq!(stats.total(), 1);
}

#[test]
fn ignores_status_changes_with_no_parent() {
    let manager = job_manager();
    let job = manager
        .create_job(JobSpec {
            definition_id: None,
            parent_id: None,
            kind: JobKind::Maintenance,
            metadata: JobMetadata::default(),
        })
        .expect("create job");

    manager.bus().subscribe_sync(Arc::new(ParentAggregator::new(Arc::clone(&manager))));

    manager
        .update_job_status(&job.id, JobStatus::Running, None)
        .expect("to running");

    let reloaded = manager.storage().jobs.get(&job.id).expect("reload");
    assert!(reloaded.metadata.step_stats.is_none());
}
