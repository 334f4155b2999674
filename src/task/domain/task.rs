//! Task aggregate and the value types it is built from.

use super::{ParseTaskStatusError, TaskDomainError, TaskId, TaskKey, VersionToken};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task progress status.
///
/// Any status may follow any other; no transition rules are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Work has not started.
    #[default]
    ToDo,
    /// Work is under way.
    InProgress,
    /// Work is finished.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "ToDo",
            Self::InProgress => "InProgress",
            Self::Done => "Done",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Self::ToDo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, non-empty task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskName(String);

impl TaskName {
    /// Creates a validated task name. The value is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        Ok(Self(raw))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskName {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskName> for String {
    fn from(value: TaskName) -> Self {
        value.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an update treats the optional due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueDateUpdate {
    /// The field was absent from the request; keep the stored value.
    #[default]
    Keep,
    /// The field was explicitly cleared.
    Clear,
    /// The field was set to a new date.
    Set(NaiveDate),
}

/// Field-presence driven partial update.
///
/// A `None` (or [`DueDateUpdate::Keep`]) leaves the stored field untouched;
/// anything else overwrites it, even when the value is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    name: Option<TaskName>,
    status: Option<TaskStatus>,
    due_date: DueDateUpdate,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the name.
    #[must_use]
    pub fn with_name(mut self, name: TaskName) -> Self {
        self.name = Some(name);
        self
    }

    /// Overwrites the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the due-date behaviour.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DueDateUpdate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Returns the name to write, if present.
    #[must_use]
    pub const fn name(&self) -> Option<&TaskName> {
        self.name.as_ref()
    }

    /// Returns the status to write, if present.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the due-date behaviour.
    #[must_use]
    pub const fn due_date(&self) -> DueDateUpdate {
        self.due_date
    }
}

/// Task fields awaiting a store write.
///
/// A draft carries no version token; the store assigns one when the write
/// succeeds and hands back a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    key: TaskKey,
    name: TaskName,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
}

impl TaskDraft {
    /// Creates a draft for a brand-new task. The status is always
    /// [`TaskStatus::ToDo`].
    #[must_use]
    pub const fn new(key: TaskKey, name: TaskName, due_date: Option<NaiveDate>) -> Self {
        Self {
            key,
            name,
            status: TaskStatus::ToDo,
            due_date,
        }
    }

    /// Applies every present field of `patch`.
    #[must_use]
    pub fn apply(mut self, patch: &TaskPatch) -> Self {
        if let Some(name) = patch.name() {
            self.name = name.clone();
        }
        if let Some(status) = patch.status() {
            self.status = status;
        }
        match patch.due_date() {
            DueDateUpdate::Keep => {}
            DueDateUpdate::Clear => self.due_date = None,
            DueDateUpdate::Set(date) => self.due_date = Some(date),
        }
        self
    }

    /// Attaches the version token assigned by a store write.
    #[must_use]
    pub fn into_task(self, version: VersionToken) -> Task {
        Task {
            key: self.key,
            name: self.name,
            status: self.status,
            due_date: self.due_date,
            version,
        }
    }

    /// Returns the task key.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

/// A task as persisted by the store, including its current version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    key: TaskKey,
    name: TaskName,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    version: VersionToken,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task key.
    pub key: TaskKey,
    /// Persisted name.
    pub name: TaskName,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted due date, if any.
    pub due_date: Option<NaiveDate>,
    /// Version token of the persisted revision.
    pub version: VersionToken,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            key: data.key,
            name: data.name,
            status: data.status,
            due_date: data.due_date,
            version: data.version,
        }
    }

    /// Returns the task key.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.key.id()
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the version token of this revision.
    #[must_use]
    pub const fn version(&self) -> &VersionToken {
        &self.version
    }

    /// Drops the version token, yielding the fields for the next write.
    #[must_use]
    pub fn into_draft(self) -> TaskDraft {
        TaskDraft {
            key: self.key,
            name: self.name,
            status: self.status,
            due_date: self.due_date,
        }
    }
}
