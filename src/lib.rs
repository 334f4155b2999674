//! Tracker: a task tracking service with a durable side archive.
//!
//! Tasks are created, read, updated and deleted through an HTTP API. The
//! record store is the source of truth and guards every write with an
//! optimistic-concurrency version token. Creates and updates publish a full
//! snapshot to an at-least-once work queue, and a background worker copies
//! those snapshots into a blob archive keyed by task id.
//!
//! # Architecture
//!
//! Tracker follows hexagonal architecture principles:
//!
//! - **Domain**: task values, partial updates and snapshots
//! - **Ports**: store, work queue and archive traits
//! - **Adapters**: in-memory, `PostgreSQL`, filesystem and HTTP
//!   implementations
//! - **Services**: the lifecycle coordinator and the archive worker
//!
//! # Modules
//!
//! - [`task`]: the task lifecycle and its adapters
//! - [`config`]: environment-driven settings
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod task;
pub mod telemetry;
