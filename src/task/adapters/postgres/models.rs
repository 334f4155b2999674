//! Diesel row models for task and queue persistence.

use super::schema::{task_queue, tasks};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Logical shard identifier.
    pub partition_key: String,
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Task status.
    pub status: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Current revision.
    pub revision: i64,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Logical shard identifier.
    pub partition_key: String,
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Task status.
    pub status: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Initial revision.
    pub revision: i64,
}

/// Query result row for queue messages.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_queue)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QueueMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Raw JSON snapshot.
    pub body: String,
    /// Enqueue timestamp.
    pub enqueued_at: DateTime<Utc>,
    /// Visibility deadline.
    pub visible_at: DateTime<Utc>,
    /// Number of deliveries so far.
    pub dequeue_count: i32,
    /// Receipt of the current lease, if leased.
    pub pop_receipt: Option<uuid::Uuid>,
}

/// Insert model for queue messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_queue)]
pub struct NewQueueMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Raw JSON snapshot.
    pub body: String,
    /// Enqueue timestamp.
    pub enqueued_at: DateTime<Utc>,
    /// Visibility deadline.
    pub visible_at: DateTime<Utc>,
    /// Number of deliveries so far.
    pub dequeue_count: i32,
    /// Receipt of the current lease, if leased.
    pub pop_receipt: Option<uuid::Uuid>,
}
