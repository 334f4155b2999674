//! In-memory archive blob store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::ArchiveKey,
    ports::{ArchiveStore, ArchiveStoreError, ArchiveStoreResult},
};

/// Thread-safe in-memory blob store keyed by [`ArchiveKey`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchiveStore {
    blobs: Arc<RwLock<HashMap<ArchiveKey, Vec<u8>>>>,
}

impl InMemoryArchiveStore {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn len(&self) -> ArchiveStoreResult<usize> {
        let blobs = self.blobs.read().map_err(|err| {
            ArchiveStoreError::backend(std::io::Error::other(err.to_string()))
        })?;
        Ok(blobs.len())
    }

    /// Returns `true` when the archive holds no blob.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn is_empty(&self) -> ArchiveStoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ArchiveStore for InMemoryArchiveStore {
    async fn put(&self, key: &ArchiveKey, content: Vec<u8>) -> ArchiveStoreResult<()> {
        let mut blobs = self.blobs.write().map_err(|err| {
            ArchiveStoreError::backend(std::io::Error::other(err.to_string()))
        })?;
        blobs.insert(key.clone(), content);
        Ok(())
    }

    async fn get(&self, key: &ArchiveKey) -> ArchiveStoreResult<Option<Vec<u8>>> {
        let blobs = self.blobs.read().map_err(|err| {
            ArchiveStoreError::backend(std::io::Error::other(err.to_string()))
        })?;
        Ok(blobs.get(key).cloned())
    }

    async fn delete_if_exists(&self, key: &ArchiveKey) -> ArchiveStoreResult<bool> {
        let mut blobs = self.blobs.write().map_err(|err| {
            ArchiveStoreError::backend(std::io::Error::other(err.to_string()))
        })?;
        Ok(blobs.remove(key).is_some())
    }
}
