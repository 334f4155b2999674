//! Application services for task lifecycle orchestration.

mod archive_processor;
mod archive_worker;
mod coordinator;

pub use archive_processor::{ArchiveProcessor, DropReason, ProcessOutcome};
pub use archive_worker::{ArchiveWorker, DEFAULT_POLL_INTERVAL};
pub use coordinator::{
    CreateTaskRequest, TaskCoordinator, TaskCoordinatorError, TaskCoordinatorResult,
    UpdateTaskRequest,
};
