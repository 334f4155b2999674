//! In-memory task store for lifecycle tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskDraft, TaskKey, VersionToken},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Version tokens come from a store-wide revision counter, so every write
/// yields a token never seen before.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    tasks: HashMap<TaskKey, Task>,
    last_revision: u64,
}

impl InMemoryStoreState {
    fn next_version(&mut self) -> VersionToken {
        self.last_revision = self.last_revision.saturating_add(1);
        VersionToken::from_revision(self.last_revision)
    }

    fn current(&self, key: &TaskKey, expected: &VersionToken) -> TaskStoreResult<&Task> {
        let task = self
            .tasks
            .get(key)
            .ok_or_else(|| TaskStoreError::NotFound(key.clone()))?;
        if task.version() != expected {
            return Err(TaskStoreError::ConcurrencyConflict {
                key: key.clone(),
                expected: expected.clone(),
            });
        }
        Ok(task)
    }
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn len(&self) -> TaskStoreResult<usize> {
        let state = self.state.read().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.tasks.len())
    }

    /// Returns `true` when no task is stored.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn is_empty(&self) -> TaskStoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, draft: &TaskDraft) -> TaskStoreResult<Task> {
        let mut state = self.state.write().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.tasks.contains_key(draft.key()) {
            return Err(TaskStoreError::AlreadyExists(draft.key().clone()));
        }

        let version = state.next_version();
        let task = draft.clone().into_task(version);
        state.tasks.insert(task.key().clone(), task.clone());
        Ok(task)
    }

    async fn get(&self, key: &TaskKey) -> TaskStoreResult<Task> {
        let state = self.state.read().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state
            .tasks
            .get(key)
            .cloned()
            .ok_or_else(|| TaskStoreError::NotFound(key.clone()))
    }

    async fn update_if_version_matches(
        &self,
        draft: &TaskDraft,
        expected: &VersionToken,
    ) -> TaskStoreResult<Task> {
        let mut state = self.state.write().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.current(draft.key(), expected)?;

        let version = state.next_version();
        let task = draft.clone().into_task(version);
        state.tasks.insert(task.key().clone(), task.clone());
        Ok(task)
    }

    async fn delete(&self, key: &TaskKey, expected: &VersionToken) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.current(key, expected)?;
        state.tasks.remove(key);
        Ok(())
    }
}
