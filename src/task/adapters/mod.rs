//! Adapter implementations of the task ports.
//!
//! - [`memory`]: in-process adapters for tests and local runs
//! - [`postgres`]: diesel-backed store and work queue
//! - [`filesystem`]: directory-backed archive
//! - [`http`]: axum routes over the coordinator

pub mod filesystem;
pub mod http;
pub mod memory;
pub mod postgres;
