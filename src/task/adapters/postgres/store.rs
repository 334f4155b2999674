//! `PostgreSQL` task store with revision-based compare-and-swap.

use super::{
    TaskPgPool,
    models::{NewTaskRow, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{
        PartitionKey, PersistedTaskData, Task, TaskDraft, TaskId, TaskKey, TaskName, TaskStatus,
        VersionToken,
    },
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Revision assigned to freshly inserted rows.
const INITIAL_REVISION: i64 = 1;

/// `PostgreSQL`-backed task store.
///
/// The version token is the row's `revision` column. Conditional writes
/// filter on the expected revision in a single statement, so concurrent
/// writers are serialized by the database row lock.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn insert(&self, draft: &TaskDraft) -> TaskStoreResult<Task> {
        let key = draft.key().clone();
        let new_row = to_new_row(draft);

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(tasks::table)
                .values(&new_row)
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::AlreadyExists(key.clone())
                    }
                    _ => TaskStoreError::persistence(err),
                })?;
            row_to_task(row)
        })
        .await
    }

    async fn get(&self, key: &TaskKey) -> TaskStoreResult<Task> {
        let lookup_key = key.clone();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(primary_key(&lookup_key))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map_or_else(|| Err(TaskStoreError::NotFound(lookup_key)), row_to_task)
        })
        .await
    }

    async fn update_if_version_matches(
        &self,
        draft: &TaskDraft,
        expected: &VersionToken,
    ) -> TaskStoreResult<Task> {
        let key = draft.key().clone();
        let expected_token = expected.clone();
        let changes = to_new_row(draft);

        self.run_blocking(move |connection| {
            let updated = match expected_revision(&expected_token) {
                Some(revision) => diesel::update(
                    tasks::table
                        .find(primary_key(&key))
                        .filter(tasks::revision.eq(revision)),
                )
                .set((
                    tasks::name.eq(&changes.name),
                    tasks::status.eq(&changes.status),
                    tasks::due_date.eq(changes.due_date),
                    tasks::revision.eq(tasks::revision + 1),
                ))
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?,
                None => None,
            };

            match updated {
                Some(row) => row_to_task(row),
                None => Err(miss_error(connection, key, expected_token)?),
            }
        })
        .await
    }

    async fn delete(&self, key: &TaskKey, expected: &VersionToken) -> TaskStoreResult<()> {
        let target = key.clone();
        let expected_token = expected.clone();

        self.run_blocking(move |connection| {
            let deleted = match expected_revision(&expected_token) {
                Some(revision) => diesel::delete(
                    tasks::table
                        .find(primary_key(&target))
                        .filter(tasks::revision.eq(revision)),
                )
                .execute(connection)
                .map_err(TaskStoreError::persistence)?,
                None => 0,
            };

            if deleted == 0 {
                return Err(miss_error(connection, target, expected_token)?);
            }
            Ok(())
        })
        .await
    }
}

fn primary_key(key: &TaskKey) -> (String, uuid::Uuid) {
    (
        key.partition_key().as_str().to_owned(),
        key.id().into_inner(),
    )
}

/// Maps a token to the revision it encodes. Foreign tokens match nothing.
fn expected_revision(token: &VersionToken) -> Option<i64> {
    token
        .revision()
        .and_then(|revision| i64::try_from(revision).ok())
}

/// Explains why a conditional write touched no row.
fn miss_error(
    connection: &mut PgConnection,
    key: TaskKey,
    expected: VersionToken,
) -> TaskStoreResult<TaskStoreError> {
    let present = diesel::select(exists(tasks::table.find(primary_key(&key))))
        .get_result::<bool>(connection)
        .map_err(TaskStoreError::persistence)?;
    if present {
        Ok(TaskStoreError::ConcurrencyConflict { key, expected })
    } else {
        Ok(TaskStoreError::NotFound(key))
    }
}

fn to_new_row(draft: &TaskDraft) -> NewTaskRow {
    NewTaskRow {
        partition_key: draft.key().partition_key().as_str().to_owned(),
        id: draft.key().id().into_inner(),
        name: draft.name().as_str().to_owned(),
        status: draft.status().as_str().to_owned(),
        due_date: draft.due_date(),
        revision: INITIAL_REVISION,
    }
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let partition =
        PartitionKey::new(row.partition_key).map_err(TaskStoreError::persistence)?;
    let task_name = TaskName::new(row.name).map_err(TaskStoreError::persistence)?;
    let task_status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskStoreError::persistence)?;
    let stored_revision = u64::try_from(row.revision).map_err(TaskStoreError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        key: TaskKey::new(partition, TaskId::from_uuid(row.id)),
        name: task_name,
        status: task_status,
        due_date: row.due_date,
        version: VersionToken::from_revision(stored_revision),
    }))
}
