//! Full task snapshots carried by the work queue and stored in the archive.
//!
//! A snapshot is a complete copy of a task at mutation time, never a delta.
//! Queue messages and archive blobs share the same JSON shape:
//!
//! ```json
//! {
//!   "partitionKey": "TasksPartition",
//!   "id": "0b4e6f3c-5d0e-4c55-9a55-5f1f1f0c2d11",
//!   "name": "Write report",
//!   "status": "ToDo",
//!   "dueDate": "2025-01-10",
//!   "versionToken": "W/\"1\""
//! }
//! ```

use super::{PartitionKey, Task, TaskId, TaskKey, TaskName, TaskStatus, VersionToken};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wire and archive representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Partition the task lives in.
    pub partition_key: PartitionKey,
    /// Task identifier.
    pub id: TaskId,
    /// Task name.
    pub name: TaskName,
    /// Task status.
    pub status: TaskStatus,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Version token of the captured revision.
    pub version_token: VersionToken,
}

/// Errors returned while decoding or encoding snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The message body is empty or whitespace.
    #[error("snapshot message is empty")]
    Empty,
    /// The message body is not a valid snapshot document.
    #[error("malformed snapshot: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The snapshot could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TaskSnapshot {
    /// Parses a snapshot from a raw queue message body.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Empty`] for blank input and
    /// [`SnapshotError::Malformed`] when the JSON does not describe a valid
    /// task (including an empty name).
    pub fn parse(body: &str) -> Result<Self, SnapshotError> {
        if body.trim().is_empty() {
            return Err(SnapshotError::Empty);
        }
        serde_json::from_str(body).map_err(SnapshotError::Malformed)
    }

    /// Encodes the snapshot as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// Encodes the snapshot as JSON bytes.
    ///
    /// Encoding is deterministic, so equal snapshots produce identical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(self).map_err(SnapshotError::Encode)
    }

    /// Returns the key of the captured task.
    #[must_use]
    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.partition_key.clone(), self.id)
    }

    /// Returns the archive blob key for the captured task.
    #[must_use]
    pub fn archive_key(&self) -> ArchiveKey {
        ArchiveKey::for_task(self.id)
    }
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            partition_key: task.key().partition_key().clone(),
            id: task.id(),
            name: task.name().clone(),
            status: task.status(),
            due_date: task.due_date(),
            version_token: task.version().clone(),
        }
    }
}

/// Blob name under which a task's snapshot is archived: `{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    /// Builds the archive key for a task.
    #[must_use]
    pub fn for_task(id: TaskId) -> Self {
        Self(format!("{id}.json"))
    }

    /// Returns the blob name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ArchiveKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
