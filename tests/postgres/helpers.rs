//! Embedded database fixtures shared by the `PostgreSQL` tests.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use tracker::task::{
    adapters::postgres::TaskPgPool,
    domain::{
        PartitionKey, PersistedTaskData, Task, TaskDraft, TaskId, TaskKey, TaskName, TaskStatus,
        VersionToken,
    },
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the `tasks` and `task_queue` tables.
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2025-01-01-000000_create_tasks/up.sql");

/// Template database holding the migrated schema.
const TEMPLATE_DB: &str = "tracker_test_template";

/// Creates a tokio runtime for async operations in tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// A throwaway database cloned from the migrated template.
///
/// The pool is declared first so its connections close before the database
/// is dropped.
pub struct TestDatabase {
    pool: TaskPgPool,
    _guard: CleanupGuard,
}

impl TestDatabase {
    /// Creates a database named after `prefix` behind a single-connection
    /// pool.
    pub fn create(cluster: &'static TestCluster, prefix: &str) -> Self {
        ensure_template(cluster).expect("template setup");
        let db_name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(&db_name, TEMPLATE_DB)
            .expect("database from template");
        let guard = CleanupGuard { cluster, db_name };
        let url = cluster.connection().database_url(&guard.db_name);
        let pool = Pool::builder()
            .max_size(1)
            .build(ConnectionManager::<PgConnection>::new(url))
            .expect("connection pool");
        Self {
            pool,
            _guard: guard,
        }
    }

    /// Returns a handle to the database's pool.
    pub fn pool(&self) -> TaskPgPool {
        self.pool.clone()
    }
}

fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_TASKS_SQL)?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Runs each statement of a migration; `sql_query` takes one at a time.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Drops the test database even when the test panics.
struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(&self.db_name) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// Builds a draft for a fresh task in the default partition.
pub fn draft(name: &str) -> TaskDraft {
    let partition = PartitionKey::new(PartitionKey::DEFAULT).expect("valid partition");
    TaskDraft::new(
        TaskKey::new(partition, TaskId::new()),
        TaskName::new(name).expect("valid name"),
        NaiveDate::from_ymd_opt(2025, 6, 30),
    )
}

/// Builds a task at `revision` without touching the database.
pub fn task_at(name: &str, revision: u64) -> Task {
    let draft = draft(name);
    Task::from_persisted(PersistedTaskData {
        key: draft.key().clone(),
        name: draft.name().clone(),
        status: TaskStatus::ToDo,
        due_date: draft.due_date(),
        version: VersionToken::from_revision(revision),
    })
}
