//! Consumer side of the work queue: persists snapshots into the archive.

use crate::task::{
    domain::{ArchiveKey, SnapshotError, TaskSnapshot, VersionToken},
    ports::ArchiveStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Why a delivery did not result in an archive write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The message body was empty or whitespace.
    Empty,
    /// The message body was not a valid task snapshot.
    Malformed,
    /// The snapshot could not be re-encoded.
    Encode,
    /// The archive rejected the write.
    ArchiveWrite,
}

/// Result of processing one delivery. Every outcome consumes the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The snapshot was written to the archive.
    Archived {
        /// Blob the snapshot was written to.
        key: ArchiveKey,
        /// Version of the archived snapshot.
        version: VersionToken,
    },
    /// The delivery was discarded.
    Dropped(DropReason),
}

/// Writes each delivered snapshot to the archive, overwriting the blob.
///
/// No ordering is enforced: a stale snapshot delivered after a newer one
/// replaces it. A snapshot still queued when its task is deleted recreates
/// the blob the delete removed, leaving an orphan for a task that no longer
/// exists. The blob content is the canonical encoding of the parsed
/// snapshot, so repeated deliveries of one message yield identical blobs.
pub struct ArchiveProcessor<A>
where
    A: ArchiveStore,
{
    archive: Arc<A>,
}

impl<A> Clone for ArchiveProcessor<A>
where
    A: ArchiveStore,
{
    fn clone(&self) -> Self {
        Self {
            archive: Arc::clone(&self.archive),
        }
    }
}

impl<A> ArchiveProcessor<A>
where
    A: ArchiveStore,
{
    /// Creates a processor writing to `archive`.
    #[must_use]
    pub const fn new(archive: Arc<A>) -> Self {
        Self { archive }
    }

    /// Processes one raw message body.
    ///
    /// Failures are logged and reported through the outcome; none is
    /// retried.
    pub async fn process(&self, body: &str) -> ProcessOutcome {
        let snapshot = match TaskSnapshot::parse(body) {
            Ok(parsed) => parsed,
            Err(SnapshotError::Empty) => {
                warn!("dropping empty archive message");
                return ProcessOutcome::Dropped(DropReason::Empty);
            }
            Err(err) => {
                error!(error = %err, "dropping malformed archive message");
                return ProcessOutcome::Dropped(DropReason::Malformed);
            }
        };

        let content = match snapshot.to_json_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(task_id = %snapshot.id, error = %err, "snapshot re-encoding failed");
                return ProcessOutcome::Dropped(DropReason::Encode);
            }
        };

        let key = snapshot.archive_key();
        if let Err(err) = self.archive.put(&key, content).await {
            error!(
                task_id = %snapshot.id,
                archive_key = %key,
                error = %err,
                "archive write failed; message consumed"
            );
            return ProcessOutcome::Dropped(DropReason::ArchiveWrite);
        }

        info!(
            task = %snapshot.key(),
            archive_key = %key,
            version = %snapshot.version_token,
            status = %snapshot.status,
            "snapshot archived"
        );
        ProcessOutcome::Archived {
            key,
            version: snapshot.version_token,
        }
    }
}
