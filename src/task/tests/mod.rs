//! Unit tests for the task module.
//!
//! Tests run against the in-memory adapters; `mockall` doubles inject
//! failures at the port boundaries.


use crate::task::{
    adapters::memory::{InMemoryArchiveStore, InMemoryTaskStore, InMemoryWorkQueue},
    domain::{PartitionKey, Task, TaskDraft, TaskId, TaskKey, TaskName, TaskSnapshot, VersionToken},
    services::TaskCoordinator,
};
use chrono::NaiveDate;
use rstest::fixture;
use std::sync::Arc;

type MemoryCoordinator = TaskCoordinator<InMemoryTaskStore, InMemoryWorkQueue, InMemoryArchiveStore>;

/// Coordinator wired to in-memory adapters, with handles kept for
/// inspection.
struct Harness {
    coordinator: MemoryCoordinator,
    store: Arc<InMemoryTaskStore>,
    queue: Arc<InMemoryWorkQueue>,
    archive: Arc<InMemoryArchiveStore>,
}

#[fixture]
fn harness() -> Harness {
    let store = Arc::new(InMemoryTaskStore::new());
    let queue = Arc::new(InMemoryWorkQueue::new());
    let archive = Arc::new(InMemoryArchiveStore::new());
    let coordinator = TaskCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&queue),
        Arc::clone(&archive),
    );
    Harness {
        coordinator,
        store,
        queue,
        archive,
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

fn sample_task(name: &str, revision: u64) -> Task {
    let key = TaskKey::new(PartitionKey::default(), TaskId::new());
    TaskDraft::new(key, TaskName::new(name).expect("valid name"), Some(date(2025, 1, 10)))
        .into_task(VersionToken::from_revision(revision))
}

fn snapshot_json(task: &Task) -> String {
    TaskSnapshot::from(task)
        .to_json()
        .expect("snapshot should encode")
}
