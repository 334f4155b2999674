//! Directory-backed archive blob store.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;
use uuid::Uuid;

use crate::task::{
    domain::ArchiveKey,
    ports::{ArchiveStore, ArchiveStoreError, ArchiveStoreResult},
};

/// Archive store writing one file per blob inside a single directory.
///
/// All file access goes through a capability handle on the archive root, so
/// blob names can never escape it. Writes land in a temporary file that is
/// renamed over the target, which keeps readers from observing partial
/// content.
#[derive(Debug, Clone)]
pub struct FilesystemArchiveStore {
    root: Arc<Dir>,
}

impl FilesystemArchiveStore {
    /// Opens (creating if needed) the archive directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveStoreError::Backend`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> ArchiveStoreResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(ArchiveStoreError::backend)?;
        let root =
            Dir::open_ambient_dir(path, ambient_authority()).map_err(ArchiveStoreError::backend)?;
        Ok(Self::from_dir(root))
    }

    /// Wraps an already opened directory capability.
    #[must_use]
    pub fn from_dir(root: Dir) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ArchiveStoreResult<T>
    where
        F: FnOnce(&Dir) -> ArchiveStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || operation(&root))
            .await
            .map_err(ArchiveStoreError::backend)?
    }
}

fn blob_name(key: &ArchiveKey) -> ArchiveStoreResult<String> {
    let name = key.as_str();
    let is_plain_file_name = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name != "..";
    if !is_plain_file_name {
        return Err(ArchiveStoreError::InvalidKey(name.to_owned()));
    }
    Ok(name.to_owned())
}

#[async_trait]
impl ArchiveStore for FilesystemArchiveStore {
    async fn put(&self, key: &ArchiveKey, content: Vec<u8>) -> ArchiveStoreResult<()> {
        let name = blob_name(key)?;
        self.run_blocking(move |root| {
            let staging = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
            root.write(&staging, &content)
                .map_err(ArchiveStoreError::backend)?;
            root.rename(&staging, root, &name).map_err(|err| {
                if root.remove_file(&staging).is_err() {
                    tracing::debug!(staging = %staging, "could not remove staging file");
                }
                ArchiveStoreError::backend(err)
            })
        })
        .await
    }

    async fn get(&self, key: &ArchiveKey) -> ArchiveStoreResult<Option<Vec<u8>>> {
        let name = blob_name(key)?;
        self.run_blocking(move |root| match root.read(&name) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ArchiveStoreError::backend(err)),
        })
        .await
    }

    async fn delete_if_exists(&self, key: &ArchiveKey) -> ArchiveStoreResult<bool> {
        let name = blob_name(key)?;
        self.run_blocking(move |root| match root.remove_file(&name) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ArchiveStoreError::backend(err)),
        })
        .await
    }
}
