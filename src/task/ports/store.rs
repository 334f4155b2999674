//! Store port for task records with optimistic concurrency.

use crate::task::domain::{Task, TaskDraft, TaskKey, VersionToken};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task persistence contract.
///
/// The store is the single source of truth and the only component with
/// linearizable per-task writes. Every successful write assigns a version
/// token strictly different from the previous one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a new task and returns it with its first version token.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::AlreadyExists`] when a task with the same key
    /// is already stored.
    async fn insert(&self, draft: &TaskDraft) -> TaskStoreResult<Task>;

    /// Reads the current revision of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when no task has the key.
    async fn get(&self, key: &TaskKey) -> TaskStoreResult<Task>;

    /// Replaces a task's fields if its current token equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist and
    /// [`TaskStoreError::ConcurrencyConflict`] when `expected` is stale.
    async fn update_if_version_matches(
        &self,
        draft: &TaskDraft,
        expected: &VersionToken,
    ) -> TaskStoreResult<Task>;

    /// Removes a task if its current token equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist and
    /// [`TaskStoreError::ConcurrencyConflict`] when `expected` is stale.
    async fn delete(&self, key: &TaskKey, expected: &VersionToken) -> TaskStoreResult<()>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same key already exists.
    #[error("task already exists: {0}")]
    AlreadyExists(TaskKey),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskKey),

    /// The supplied version token no longer matches the stored revision.
    #[error("version conflict on task {key}: expected {expected}")]
    ConcurrencyConflict {
        /// Key of the contested task.
        key: TaskKey,
        /// Token presented by the writer.
        expected: VersionToken,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
