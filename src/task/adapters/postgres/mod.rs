//! `PostgreSQL` adapters for task records and the work queue.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

mod models;
mod queue;
mod schema;
mod store;

pub use queue::PostgresWorkQueue;
pub use store::PostgresTaskStore;

/// `PostgreSQL` connection pool shared by the task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;
