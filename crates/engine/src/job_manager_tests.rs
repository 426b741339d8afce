use super::*;
use quaero_core::{Clock, EventBus, FakeClock, JobKind, JobMetadata, SequentialIdGen, UuidIdGen};
use quaero_storage::StorageManager;
use std::sync::atomic::{AtomicUsize, Ordering};

fn manager() -> JobManager {
    let path = tempfile::NamedTempFile::new().expect("tempfile");
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let storage = Arc::new(StorageManager::open(path.path().to_str().expect("utf8 path"), clock).expect("open storage"));
    std::mem::forget(path);
    JobManager::new(storage, EventBus::new(), Arc::new(UuidIdGen))
}

fn spec(parent_id: Option<JobId>, kind: JobKind) -> JobSpec {
    JobSpec {
        definition_id: None,
        parent_id,
        kind,
        metadata: JobMetadata::default(),
    }
}

#[test]
fn create_job_persists_pending_and_publishes_job_created() {
    let manager = manager();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = Arc::clone(&seen);
    manager.bus().subscribe_sync(Arc::new(move |event: &quaero_core::Event| {
        if matches!(event, quaero_core::Event::JobCreated { .. }) {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }
    }));

    let job = manager.create_job(spec(None, JobKind::Crawler)).expect("create");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn update_job_status_publishes_status_change_and_completed_on_terminal() {
    let manager = manager();
    let job = manager.create_job(spec(None, JobKind::Maintenance)).expect("create");

    let status_changes = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));
    let sc = Arc::clone(&status_changes);
    let cc = Arc::clone(&completions);
    manager.bus().subscribe_sync(Arc::new(move |event: &quaero_core::Event| match event {
        quaero_core::Event::JobStatusChange { .. } => {
            sc.fetch_add(1, Ordering::SeqCst);
        }
        quaero_core::Event::JobCompleted { .. } => {
            cc.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    }));

    manager.update_job_status(&job.id, JobStatus::Running, None).expect("to running");
    manager
        .update_job_status(&job.id, JobStatus::Completed, None)
        .expect("to completed");

    assert_eq!(status_changes.load(Ordering::SeqCst), 2);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn refresh_parent_step_stats_persists_and_publishes() {
    let manager = manager();
    let id_gen = SequentialIdGen::new("job");
    let parent = manager.create_job(spec(None, JobKind::Crawler)).expect("create parent");
    let child = manager
        .storage()
        .jobs
        .create_job(spec(Some(parent.id.clone()), JobKind::Crawler), &id_gen)
        .expect("create child");

    manager.update_job_status(&child.id, JobStatus::Running, None).expect("to running");

    let events = Arc::new(AtomicUsize::new(0));
    let events_clone = Arc::clone(&events);
    manager.bus().subscribe_sync(Arc::new(move |event: &quaero_core::Event| {
        if matches!(event, quaero_core::Event::ParentJobProgress { .. }) {
            events_clone.fetch_add(1, Ordering::SeqCst);
        }
    }));

    manager.refresh_parent_step_stats(&parent.id).expect("refresh");

    let reloaded = manager.storage().jobs.get(&parent.id).expect("reload parent");
    assert_eq!(reloaded.metadata.step_stats.expect("stats").running, 1);
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[test]
fn update_job_status_on_terminal_job_is_rejected() {
    let manager = manager();
    let job = manager.create_job(spec(None, JobKind::Maintenance)).expect("create");
    manager.update_job_status(&job.id, JobStatus::Completed, None).expect("complete");

    let result = manager.update_job_status(&job.id, JobStatus::Running, None);
    assert!(result.is_err());
}
