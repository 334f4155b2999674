//! Archive blob store port: one JSON snapshot per task id.

use crate::task::domain::ArchiveKey;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for archive store operations.
pub type ArchiveStoreResult<T> = Result<T, ArchiveStoreError>;

/// Key/value blob storage for archived task snapshots.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Writes a blob, replacing any existing content under the same key.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveStoreError`] when the backend rejects the write.
    async fn put(&self, key: &ArchiveKey, content: Vec<u8>) -> ArchiveStoreResult<()>;

    /// Reads a blob.
    ///
    /// Returns `None` when no blob exists under the key.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveStoreError`] on backend failures.
    async fn get(&self, key: &ArchiveKey) -> ArchiveStoreResult<Option<Vec<u8>>>;

    /// Deletes a blob if it exists.
    ///
    /// Returns `true` when a blob was removed; absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveStoreError`] on backend failures.
    async fn delete_if_exists(&self, key: &ArchiveKey) -> ArchiveStoreResult<bool>;
}

/// Errors returned by archive store implementations.
#[derive(Debug, Clone, Error)]
pub enum ArchiveStoreError {
    /// The blob key cannot be represented by the backend.
    #[error("invalid archive key: {0}")]
    InvalidKey(String),

    /// Backend failure.
    #[error("archive backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl ArchiveStoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
