//! Domain model for task tracking.
//!
//! The task domain models task records, partial updates and the snapshots
//! that flow from the store to the archive, while keeping all
//! infrastructure concerns outside of the domain boundary.

mod error;
mod ids;
mod snapshot;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{PartitionKey, TaskId, TaskKey, VersionToken};
pub use snapshot::{ArchiveKey, SnapshotError, TaskSnapshot};
pub use task::{
    DueDateUpdate, PersistedTaskData, Task, TaskDraft, TaskName, TaskPatch, TaskStatus,
};
