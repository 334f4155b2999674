//! `PostgreSQL` work queue using row leases.

use super::{
    TaskPgPool,
    models::{NewQueueMessageRow, QueueMessageRow},
    schema::task_queue,
};
use crate::task::{
    domain::TaskSnapshot,
    ports::{
        DEFAULT_VISIBILITY_TIMEOUT, MessageId, PopReceipt, QueueDelivery, WorkQueue,
        WorkQueueError, WorkQueueResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Work queue stored in the `task_queue` table.
///
/// Dequeue leases the oldest visible row with `FOR UPDATE SKIP LOCKED`, so
/// concurrent consumers never lease the same message at once. A lease pushes
/// `visible_at` forward by the visibility timeout and stamps a fresh pop
/// receipt; acknowledgement deletes the row only if that receipt is still
/// current.
pub struct PostgresWorkQueue<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    pool: TaskPgPool,
    clock: Arc<C>,
    visibility_timeout: TimeDelta,
}

impl PostgresWorkQueue<DefaultClock> {
    /// Creates a queue using the system clock and the default visibility
    /// timeout.
    #[must_use]
    pub fn new(pool: TaskPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock), DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl<C> Clone for PostgresWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
            visibility_timeout: self.visibility_timeout,
        }
    }
}

impl<C> PostgresWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a queue driven by `clock` with a custom visibility timeout.
    #[must_use]
    pub fn with_clock(pool: TaskPgPool, clock: Arc<C>, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            clock,
            visibility_timeout: TimeDelta::from_std(visibility_timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkQueueResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkQueueResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkQueueError::backend)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkQueueError::backend)?
    }
}

#[async_trait]
impl<C> WorkQueue for PostgresWorkQueue<C>
where
    C: Clock + Send + Sync,
{
    async fn enqueue(&self, snapshot: &TaskSnapshot) -> WorkQueueResult<MessageId> {
        let body = snapshot.to_json().map_err(WorkQueueError::encode)?;
        let now = self.clock.utc();
        let new_row = NewQueueMessageRow {
            id: Uuid::new_v4(),
            body,
            enqueued_at: now,
            visible_at: now,
            dequeue_count: 0,
            pop_receipt: None,
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(task_queue::table)
                .values(&new_row)
                .execute(connection)
                .map_err(WorkQueueError::backend)?;
            Ok(MessageId::from_uuid(new_row.id))
        })
        .await
    }

    async fn dequeue(&self) -> WorkQueueResult<Option<QueueDelivery>> {
        let now = self.clock.utc();
        let hidden_until = now
            .checked_add_signed(self.visibility_timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let receipt = PopReceipt::new();

        self.run_blocking(move |connection| {
            let leased = connection
                .transaction::<_, DieselError, _>(|tx| {
                    let candidate = task_queue::table
                        .filter(task_queue::visible_at.le(now))
                        .order(task_queue::enqueued_at.asc())
                        .select(task_queue::id)
                        .limit(1)
                        .for_update()
                        .skip_locked()
                        .get_result::<Uuid>(tx)
                        .optional()?;
                    let Some(message_id) = candidate else {
                        return Ok(None);
                    };

                    diesel::update(task_queue::table.find(message_id))
                        .set((
                            task_queue::visible_at.eq(hidden_until),
                            task_queue::dequeue_count.eq(task_queue::dequeue_count + 1),
                            task_queue::pop_receipt.eq(Some(receipt.into_inner())),
                        ))
                        .returning(QueueMessageRow::as_returning())
                        .get_result::<QueueMessageRow>(tx)
                        .map(Some)
                })
                .map_err(WorkQueueError::backend)?;

            leased.map(row_to_delivery).transpose()
        })
        .await
    }

    async fn acknowledge(&self, delivery: &QueueDelivery) -> WorkQueueResult<()> {
        let message_id = delivery.message_id();
        let receipt = delivery.receipt();

        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                task_queue::table
                    .find(message_id.into_inner())
                    .filter(task_queue::pop_receipt.eq(receipt.into_inner())),
            )
            .execute(connection)
            .map_err(WorkQueueError::backend)?;

            if deleted == 0 {
                return Err(WorkQueueError::ReceiptMismatch {
                    message_id,
                    receipt,
                });
            }
            Ok(())
        })
        .await
    }
}

fn row_to_delivery(row: QueueMessageRow) -> WorkQueueResult<QueueDelivery> {
    let receipt = row
        .pop_receipt
        .map(PopReceipt::from_uuid)
        .ok_or_else(|| WorkQueueError::backend(std::io::Error::other("leased row has no receipt")))?;
    let dequeue_count = u32::try_from(row.dequeue_count).map_err(WorkQueueError::backend)?;
    Ok(QueueDelivery::new(
        MessageId::from_uuid(row.id),
        receipt,
        dequeue_count,
        row.body,
    ))
}
