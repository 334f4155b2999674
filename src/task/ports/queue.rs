//! Work queue port carrying task snapshots to the archive processor.

use crate::task::domain::TaskSnapshot;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Visibility timeout applied by queue adapters when none is configured.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for work queue operations.
pub type WorkQueueResult<T> = Result<T, WorkQueueError>;

/// Durable, at-least-once delivery channel.
///
/// A dequeued message stays hidden until it is acknowledged or its
/// visibility timeout elapses; in the latter case it is delivered again.
/// Consumers must therefore treat every delivery as a potential duplicate,
/// and as potentially stale relative to other in-flight messages for the
/// same task: no ordering is guaranteed.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Durably enqueues a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkQueueError`] when the snapshot cannot be encoded or the
    /// backend rejects the write.
    async fn enqueue(&self, snapshot: &TaskSnapshot) -> WorkQueueResult<MessageId>;

    /// Leases the next visible message, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WorkQueueError::Backend`] on backend failures.
    async fn dequeue(&self) -> WorkQueueResult<Option<QueueDelivery>>;

    /// Deletes a delivered message.
    ///
    /// # Errors
    ///
    /// Returns [`WorkQueueError::ReceiptMismatch`] when the message was
    /// redelivered (or already deleted) since this delivery was issued.
    async fn acknowledge(&self, delivery: &QueueDelivery) -> WorkQueueResult<()>;
}

/// Identifier of an enqueued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof of a specific lease on a message. Each delivery gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopReceipt(Uuid);

impl PopReceipt {
    /// Creates a new random receipt.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a receipt from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for PopReceipt {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PopReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single delivery of a queued message.
///
/// The body is kept raw so that consumers decide how to treat malformed
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDelivery {
    message_id: MessageId,
    receipt: PopReceipt,
    dequeue_count: u32,
    body: String,
}

impl QueueDelivery {
    /// Creates a delivery record.
    #[must_use]
    pub const fn new(
        message_id: MessageId,
        receipt: PopReceipt,
        dequeue_count: u32,
        body: String,
    ) -> Self {
        Self {
            message_id,
            receipt,
            dequeue_count,
            body,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Returns the lease receipt.
    #[must_use]
    pub const fn receipt(&self) -> PopReceipt {
        self.receipt
    }

    /// Returns how many times the message has been delivered, this delivery
    /// included.
    #[must_use]
    pub const fn dequeue_count(&self) -> u32 {
        self.dequeue_count
    }

    /// Returns the raw message body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Errors returned by work queue implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkQueueError {
    /// The snapshot could not be encoded as a message body.
    #[error("failed to encode queue message: {0}")]
    Encode(Arc<dyn std::error::Error + Send + Sync>),

    /// The receipt does not match the message's current lease.
    #[error("pop receipt {receipt} no longer valid for message {message_id}")]
    ReceiptMismatch {
        /// Message the acknowledgement targeted.
        message_id: MessageId,
        /// Receipt that was presented.
        receipt: PopReceipt,
    },

    /// Backend failure.
    #[error("queue backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkQueueError {
    /// Wraps an encoding error.
    pub fn encode(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Encode(Arc::new(err))
    }

    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
