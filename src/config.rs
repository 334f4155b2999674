//! Environment-driven service configuration.
//!
//! Every setting has a default except the backend locations: leaving
//! `TRACKER_DATABASE_URL` or `TRACKER_ARCHIVE_DIR` unset selects the
//! in-memory adapter for that port.

use crate::task::{
    domain::PartitionKey, ports::DEFAULT_VISIBILITY_TIMEOUT, services::DEFAULT_POLL_INTERVAL,
};
use camino::Utf8PathBuf;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Listen address.
pub const BIND_ADDR_VAR: &str = "TRACKER_BIND_ADDR";
/// Partition for newly created tasks.
pub const PARTITION_KEY_VAR: &str = "TRACKER_PARTITION_KEY";
/// `PostgreSQL` connection URL for the task store and work queue.
pub const DATABASE_URL_VAR: &str = "TRACKER_DATABASE_URL";
/// Directory holding archive blobs.
pub const ARCHIVE_DIR_VAR: &str = "TRACKER_ARCHIVE_DIR";
/// Queue visibility timeout, in seconds.
pub const VISIBILITY_TIMEOUT_VAR: &str = "TRACKER_QUEUE_VISIBILITY_TIMEOUT_SECS";
/// Archive worker idle poll interval, in milliseconds.
pub const POLL_INTERVAL_VAR: &str = "TRACKER_QUEUE_POLL_INTERVAL_MS";

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Runtime settings for the tracker service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Partition new tasks are created in.
    pub partition_key: PartitionKey,
    /// `PostgreSQL` URL; `None` keeps tasks and queue in memory.
    pub database_url: Option<String>,
    /// Archive directory; `None` keeps the archive in memory.
    pub archive_dir: Option<Utf8PathBuf>,
    /// How long a dequeued message stays hidden before redelivery.
    pub visibility_timeout: Duration,
    /// Archive worker sleep between polls of an empty queue.
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            partition_key: PartitionKey::default(),
            database_url: None,
            archive_dir: None,
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TrackerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set but
    /// unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set but
    /// unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = match read(BIND_ADDR_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|err| invalid(BIND_ADDR_VAR, &raw, &err))?,
            None => SocketAddr::from(DEFAULT_BIND_ADDR),
        };
        let partition_key = match read(PARTITION_KEY_VAR) {
            Some(raw) => PartitionKey::new(raw.trim().to_owned())
                .map_err(|err| invalid(PARTITION_KEY_VAR, &raw, &err))?,
            None => PartitionKey::default(),
        };
        let visibility_timeout = match read(VISIBILITY_TIMEOUT_VAR) {
            Some(raw) => Duration::from_secs(parse_u64(VISIBILITY_TIMEOUT_VAR, &raw)?),
            None => DEFAULT_VISIBILITY_TIMEOUT,
        };
        let poll_interval = match read(POLL_INTERVAL_VAR) {
            Some(raw) => match parse_u64(POLL_INTERVAL_VAR, &raw)? {
                0 => return Err(invalid(POLL_INTERVAL_VAR, &raw, &"must be greater than zero")),
                millis => Duration::from_millis(millis),
            },
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            bind_addr,
            partition_key,
            database_url: read(DATABASE_URL_VAR),
            archive_dir: read(ARCHIVE_DIR_VAR).map(Utf8PathBuf::from),
            visibility_timeout,
            poll_interval,
        })
    }
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|err| invalid(key, raw, &err))
}

fn invalid(key: &'static str, value: &str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_owned(),
        reason: err.to_string(),
    }
}
