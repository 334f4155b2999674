//! Task lifecycle management.
//!
//! The coordinator keeps three stores consistent without cross-store
//! transactions: the task store (authoritative, version-checked writes), the
//! work queue (snapshots, at-least-once) and the archive (latest processed
//! snapshot per task). The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
