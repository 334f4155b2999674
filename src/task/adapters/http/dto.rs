//! Request bodies accepted by the HTTP adapter.
//!
//! Responses reuse [`TaskSnapshot`](crate::task::domain::TaskSnapshot) so the
//! API, the queue and the archive share one JSON shape.

use crate::task::{
    domain::{DueDateUpdate, TaskStatus},
    services::{CreateTaskRequest, UpdateTaskRequest},
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    /// Task name; a missing name is rejected like an empty one.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional due date (`YYYY-MM-DD`).
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl CreateTaskBody {
    /// Converts the body into a coordinator request.
    #[must_use]
    pub fn into_request(self) -> CreateTaskRequest {
        let mut request = CreateTaskRequest::new(self.name.unwrap_or_default());
        if let Some(due_date) = self.due_date {
            request = request.with_due_date(due_date);
        }
        request
    }
}

/// Body of `PUT /tasks/{partitionKey}/{id}`.
///
/// A field missing from the JSON is left untouched. `null` clears
/// `dueDate` and is ignored for `name` and `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    /// New name, if present.
    #[serde(default)]
    pub name: Option<String>,
    /// New status, if present.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// `None` when absent, `Some(None)` when explicitly `null`.
    #[serde(default, deserialize_with = "present_field")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateTaskBody {
    /// Converts the body into a coordinator request.
    #[must_use]
    pub fn into_request(self) -> UpdateTaskRequest {
        let mut request = UpdateTaskRequest::new();
        if let Some(name) = self.name {
            request = request.with_name(name);
        }
        if let Some(status) = self.status {
            request = request.with_status(status);
        }
        let due_date = match self.due_date {
            None => DueDateUpdate::Keep,
            Some(None) => DueDateUpdate::Clear,
            Some(Some(date)) => DueDateUpdate::Set(date),
        };
        request.with_due_date(due_date)
    }
}

fn present_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
