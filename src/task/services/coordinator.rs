//! Task lifecycle coordination across the store, work queue and archive.

use crate::task::{
    domain::{
        ArchiveKey, DueDateUpdate, PartitionKey, Task, TaskDomainError, TaskDraft, TaskId, TaskKey,
        TaskName, TaskPatch, TaskSnapshot, TaskStatus, VersionToken,
    },
    ports::{ArchiveStore, TaskStore, TaskStoreError, WorkQueue},
};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    due_date: Option<NaiveDate>,
}

impl CreateTaskRequest {
    /// Creates a request with the raw task name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            due_date: None,
        }
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Request payload for a partial task update.
///
/// Fields left unset are not touched. Only the due date has an explicit
/// cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    name: Option<String>,
    status: Option<TaskStatus>,
    due_date: DueDateUpdate,
    expected_version: Option<VersionToken>,
}

impl UpdateTaskRequest {
    /// Creates a request that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the name. The value is validated when the update runs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overwrites the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets, clears or keeps the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DueDateUpdate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Requires the stored task to be at this version.
    #[must_use]
    pub fn with_expected_version(mut self, version: VersionToken) -> Self {
        self.expected_version = Some(version);
        self
    }

    fn into_patch(self) -> Result<(TaskPatch, Option<VersionToken>), TaskDomainError> {
        let mut patch = TaskPatch::new().with_due_date(self.due_date);
        if let Some(raw_name) = self.name {
            patch = patch.with_name(TaskName::new(raw_name)?);
        }
        if let Some(status) = self.status {
            patch = patch.with_status(status);
        }
        Ok((patch, self.expected_version))
    }
}

/// Service-level errors for task coordination.
#[derive(Debug, Error)]
pub enum TaskCoordinatorError {
    /// Input validation failed; nothing was written.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskKey),

    /// The task changed since the caller (or this service) last read it.
    #[error("task {0} was modified concurrently")]
    ConcurrencyConflict(TaskKey),

    /// Store failure other than a missing task or a stale version.
    #[error(transparent)]
    Store(TaskStoreError),
}

impl From<TaskStoreError> for TaskCoordinatorError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(key) => Self::NotFound(key),
            TaskStoreError::ConcurrencyConflict { key, .. } => Self::ConcurrencyConflict(key),
            other => Self::Store(other),
        }
    }
}

/// Result type for coordinator operations.
pub type TaskCoordinatorResult<T> = Result<T, TaskCoordinatorError>;

/// Orchestrates task mutations without cross-store transactions.
///
/// The store is written first and is authoritative. Creates and updates then
/// publish a full snapshot to the work queue; a publish failure is logged and
/// the store write stands. Deletes skip the queue and remove the archive
/// blob directly, best-effort.
pub struct TaskCoordinator<S, Q, A>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    store: Arc<S>,
    queue: Arc<Q>,
    archive: Arc<A>,
    partition_key: PartitionKey,
}

impl<S, Q, A> Clone for TaskCoordinator<S, Q, A>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            archive: Arc::clone(&self.archive),
            partition_key: self.partition_key.clone(),
        }
    }
}

impl<S, Q, A> TaskCoordinator<S, Q, A>
where
    S: TaskStore,
    Q: WorkQueue,
    A: ArchiveStore,
{
    /// Creates a coordinator placing new tasks in the default partition.
    #[must_use]
    pub fn new(store: Arc<S>, queue: Arc<Q>, archive: Arc<A>) -> Self {
        Self {
            store,
            queue,
            archive,
            partition_key: PartitionKey::default(),
        }
    }

    /// Places new tasks in `partition_key` instead of the default.
    #[must_use]
    pub fn with_partition_key(mut self, partition_key: PartitionKey) -> Self {
        self.partition_key = partition_key;
        self
    }

    /// Returns the partition new tasks are created in.
    #[must_use]
    pub const fn partition_key(&self) -> &PartitionKey {
        &self.partition_key
    }

    /// Creates a task in the `ToDo` status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Domain`] when the name is empty (no
    /// store write happens) and [`TaskCoordinatorError::Store`] when the
    /// insert fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskCoordinatorResult<Task> {
        let name = TaskName::new(request.name)?;
        let key = TaskKey::new(self.partition_key.clone(), TaskId::new());
        let draft = TaskDraft::new(key, name, request.due_date);

        let task = self.store.insert(&draft).await?;
        info!(
            partition_key = %task.key().partition_key(),
            task_id = %task.id(),
            "task created"
        );
        self.publish(&task).await;
        Ok(task)
    }

    /// Reads the current revision of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::NotFound`] when the task is absent.
    pub async fn get(&self, key: &TaskKey) -> TaskCoordinatorResult<Task> {
        Ok(self.store.get(key).await?)
    }

    /// Applies the present fields of `request` to a task.
    ///
    /// The write is conditional on the version read just before it, so a
    /// concurrent writer causes a conflict rather than a lost update. The
    /// task is read before the patch is validated: a missing task is
    /// reported as missing whatever the request holds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::NotFound`] when the task is absent,
    /// [`TaskCoordinatorError::Domain`] for an empty name and
    /// [`TaskCoordinatorError::ConcurrencyConflict`] when the expected
    /// version is stale.
    pub async fn update(
        &self,
        key: &TaskKey,
        request: UpdateTaskRequest,
    ) -> TaskCoordinatorResult<Task> {
        let current = self.store.get(key).await?;
        let (patch, expected) = request.into_patch()?;
        ensure_version(key, &current, expected.as_ref())?;

        let read_version = current.version().clone();
        let draft = current.into_draft().apply(&patch);
        let updated = self
            .store
            .update_if_version_matches(&draft, &read_version)
            .await?;
        info!(
            partition_key = %key.partition_key(),
            task_id = %key.id(),
            status = %updated.status(),
            "task updated"
        );
        self.publish(&updated).await;
        Ok(updated)
    }

    /// Deletes a task and, best-effort, its archive blob.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::NotFound`] when the task is absent and
    /// [`TaskCoordinatorError::ConcurrencyConflict`] when `expected` (or the
    /// version read just before the delete) is stale.
    pub async fn delete(
        &self,
        key: &TaskKey,
        expected: Option<&VersionToken>,
    ) -> TaskCoordinatorResult<()> {
        let current = self.store.get(key).await?;
        ensure_version(key, &current, expected)?;
        self.store.delete(key, current.version()).await?;
        info!(
            partition_key = %key.partition_key(),
            task_id = %key.id(),
            "task deleted"
        );

        let archive_key = ArchiveKey::for_task(key.id());
        match self.archive.delete_if_exists(&archive_key).await {
            Ok(removed) => debug!(archive_key = %archive_key, removed, "archive blob cleanup"),
            Err(err) => warn!(
                archive_key = %archive_key,
                error = %err,
                "archive blob left behind after task delete"
            ),
        }
        Ok(())
    }

    async fn publish(&self, task: &Task) {
        let snapshot = TaskSnapshot::from(task);
        match self.queue.enqueue(&snapshot).await {
            Ok(message_id) => debug!(
                task_id = %task.id(),
                message_id = %message_id,
                "snapshot published"
            ),
            Err(err) => warn!(
                task_id = %task.id(),
                version = %task.version(),
                error = %err,
                "snapshot publish failed; archive will lag until the next write"
            ),
        }
    }
}

fn ensure_version(
    key: &TaskKey,
    current: &Task,
    expected: Option<&VersionToken>,
) -> TaskCoordinatorResult<()> {
    match expected {
        Some(version) if version != current.version() => {
            Err(TaskCoordinatorError::ConcurrencyConflict(key.clone()))
        }
        _ => Ok(()),
    }
}
