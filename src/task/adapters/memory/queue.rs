//! In-memory work queue with visibility-timeout redelivery.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::task::{
    domain::TaskSnapshot,
    ports::{
        DEFAULT_VISIBILITY_TIMEOUT, MessageId, PopReceipt, QueueDelivery, WorkQueue,
        WorkQueueError, WorkQueueResult,
    },
};

/// Thread-safe in-memory work queue.
///
/// Dequeued messages are hidden for the visibility timeout; unacknowledged
/// messages reappear afterwards with a fresh pop receipt, which models the
/// at-least-once contract of durable queues.
pub struct InMemoryWorkQueue<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryQueueState>>,
    clock: Arc<C>,
    visibility_timeout: TimeDelta,
}

#[derive(Debug, Default)]
struct InMemoryQueueState {
    messages: VecDeque<StoredMessage>,
}

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    body: String,
    visible_at: DateTime<Utc>,
    dequeue_count: u32,
    receipt: Option<PopReceipt>,
}

impl InMemoryWorkQueue<DefaultClock> {
    /// Creates an empty queue using the system clock and the default
    /// visibility timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock), DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl Default for InMemoryWorkQueue<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
            visibility_timeout: self.visibility_timeout,
        }
    }
}

impl<C> InMemoryWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty queue driven by `clock`.
    ///
    /// Timeouts too large for the clock's range saturate.
    #[must_use]
    pub fn with_clock(clock: Arc<C>, visibility_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryQueueState::default())),
            clock,
            visibility_timeout: TimeDelta::from_std(visibility_timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Enqueues an arbitrary body without snapshot encoding.
    ///
    /// Useful for exercising consumers against malformed messages.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn enqueue_raw(&self, body: impl Into<String>) -> WorkQueueResult<MessageId> {
        let now = self.clock.utc();
        let mut state = self.state.write().map_err(|err| {
            WorkQueueError::backend(std::io::Error::other(err.to_string()))
        })?;
        let id = MessageId::new();
        state.messages.push_back(StoredMessage {
            id,
            body: body.into(),
            visible_at: now,
            dequeue_count: 0,
            receipt: None,
        });
        Ok(id)
    }

    /// Returns the number of messages not yet acknowledged, leased ones
    /// included.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn len(&self) -> WorkQueueResult<usize> {
        let state = self.state.read().map_err(|err| {
            WorkQueueError::backend(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.messages.len())
    }

    /// Returns `true` when every message has been acknowledged.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn is_empty(&self) -> WorkQueueResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl<C> WorkQueue for InMemoryWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    async fn enqueue(&self, snapshot: &TaskSnapshot) -> WorkQueueResult<MessageId> {
        let body = snapshot.to_json().map_err(WorkQueueError::encode)?;
        self.enqueue_raw(body)
    }

    async fn dequeue(&self) -> WorkQueueResult<Option<QueueDelivery>> {
        let now = self.clock.utc();
        let hidden_until = now
            .checked_add_signed(self.visibility_timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut state = self.state.write().map_err(|err| {
            WorkQueueError::backend(std::io::Error::other(err.to_string()))
        })?;

        let Some(message) = state
            .messages
            .iter_mut()
            .find(|message| message.visible_at <= now)
        else {
            return Ok(None);
        };

        let receipt = PopReceipt::new();
        message.visible_at = hidden_until;
        message.dequeue_count = message.dequeue_count.saturating_add(1);
        message.receipt = Some(receipt);
        Ok(Some(QueueDelivery::new(
            message.id,
            receipt,
            message.dequeue_count,
            message.body.clone(),
        )))
    }

    async fn acknowledge(&self, delivery: &QueueDelivery) -> WorkQueueResult<()> {
        let mut state = self.state.write().map_err(|err| {
            WorkQueueError::backend(std::io::Error::other(err.to_string()))
        })?;
        let position = state.messages.iter().position(|message| {
            message.id == delivery.message_id() && message.receipt == Some(delivery.receipt())
        });
        match position {
            Some(index) => {
                state.messages.remove(index);
                Ok(())
            }
            None => Err(WorkQueueError::ReceiptMismatch {
                message_id: delivery.message_id(),
                receipt: delivery.receipt(),
            }),
        }
    }
}
