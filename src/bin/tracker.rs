//! Tracker HTTP service.
//!
//! Usage:
//!
//! ```text
//! TRACKER_DATABASE_URL=postgres://... TRACKER_ARCHIVE_DIR=/var/lib/tracker tracker
//! ```
//!
//! Serves the task API and runs the archive worker in the same process.
//! Without `TRACKER_DATABASE_URL` the task store and work queue live in
//! memory; without `TRACKER_ARCHIVE_DIR` so does the archive. Ctrl-C stops
//! the listener first, then the worker.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracker::config::TrackerConfig;
use tracker::task::{
    adapters::{
        filesystem::FilesystemArchiveStore,
        http::router,
        memory::{InMemoryArchiveStore, InMemoryTaskStore, InMemoryWorkQueue},
        postgres::{PostgresTaskStore, PostgresWorkQueue, TaskPgPool},
    },
    ports::{ArchiveStore, TaskStore, WorkQueue},
    services::{ArchiveWorker, TaskCoordinator},
};
use tracker::telemetry::{DEFAULT_DIRECTIVE, init_tracing};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing(DEFAULT_DIRECTIVE)?;
    let config = TrackerConfig::from_env()?;

    match config.database_url.clone() {
        Some(url) => {
            info!("using PostgreSQL task store and work queue");
            let pool = connect(url).await?;
            let store = Arc::new(PostgresTaskStore::new(pool.clone()));
            let queue = Arc::new(PostgresWorkQueue::with_clock(
                pool,
                Arc::new(DefaultClock),
                config.visibility_timeout,
            ));
            with_archive(&config, store, queue).await
        }
        None => {
            info!("using in-memory task store and work queue");
            let store = Arc::new(InMemoryTaskStore::new());
            let queue = Arc::new(InMemoryWorkQueue::with_clock(
                Arc::new(DefaultClock),
                config.visibility_timeout,
            ));
            with_archive(&config, store, queue).await
        }
    }
}

async fn connect(url: String) -> Result<TaskPgPool, BoxError> {
    let pool = tokio::task::spawn_blocking(move || {
        Pool::builder().build(ConnectionManager::<PgConnection>::new(url))
    })
    .await??;
    Ok(pool)
}

async fn with_archive<S, Q>(
    config: &TrackerConfig,
    store: Arc<S>,
    queue: Arc<Q>,
) -> Result<(), BoxError>
where
    S: TaskStore + 'static,
    Q: WorkQueue + 'static,
{
    match &config.archive_dir {
        Some(dir) => {
            info!(archive_dir = %dir, "using filesystem archive");
            let archive = Arc::new(FilesystemArchiveStore::open(dir)?);
            serve(config, store, queue, archive).await
        }
        None => {
            info!("using in-memory archive");
            serve(config, store, queue, Arc::new(InMemoryArchiveStore::new())).await
        }
    }
}

async fn serve<S, Q, A>(
    config: &TrackerConfig,
    store: Arc<S>,
    queue: Arc<Q>,
    archive: Arc<A>,
) -> Result<(), BoxError>
where
    S: TaskStore + 'static,
    Q: WorkQueue + 'static,
    A: ArchiveStore + 'static,
{
    let coordinator = TaskCoordinator::new(store, Arc::clone(&queue), Arc::clone(&archive))
        .with_partition_key(config.partition_key.clone());
    let worker = ArchiveWorker::new(queue, archive).with_poll_interval(config.poll_interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        partition_key = %config.partition_key,
        "tracker listening"
    );
    axum::serve(listener, router(Arc::new(coordinator)))
        .with_graceful_shutdown(ctrl_c())
        .await?;

    if shutdown_tx.send(true).is_err() {
        debug!("archive worker already stopped");
    }
    worker_handle.await?;
    Ok(())
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
