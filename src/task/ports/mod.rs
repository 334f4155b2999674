//! Port contracts for task lifecycle coordination.
//!
//! Ports define infrastructure-agnostic interfaces used by task services:
//! the record store (source of truth), the work queue and the archive blob
//! store.

pub mod archive;
pub mod queue;
pub mod store;

pub use archive::{ArchiveStore, ArchiveStoreError, ArchiveStoreResult};
pub use queue::{
    DEFAULT_VISIBILITY_TIMEOUT, MessageId, PopReceipt, QueueDelivery, WorkQueue, WorkQueueError,
    WorkQueueResult,
};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
