//! Polling loop feeding queue deliveries to the archive processor.

use super::archive_processor::{ArchiveProcessor, ProcessOutcome};
use crate::task::ports::{ArchiveStore, WorkQueue, WorkQueueResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Pause between polls when the queue is empty or failing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drains the work queue into the archive.
///
/// Every delivery is acknowledged after processing, whatever the outcome.
/// A failed acknowledgement leaves the message to be redelivered once its
/// visibility timeout elapses.
pub struct ArchiveWorker<Q, A>
where
    Q: WorkQueue,
    A: ArchiveStore,
{
    queue: Arc<Q>,
    processor: ArchiveProcessor<A>,
    poll_interval: Duration,
}

impl<Q, A> ArchiveWorker<Q, A>
where
    Q: WorkQueue,
    A: ArchiveStore,
{
    /// Creates a worker with the default poll interval.
    #[must_use]
    pub const fn new(queue: Arc<Q>, archive: Arc<A>) -> Self {
        Self {
            queue,
            processor: ArchiveProcessor::new(archive),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the idle poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Handles at most one delivery.
    ///
    /// Returns `Ok(None)` when no message is visible.
    ///
    /// # Errors
    ///
    /// Returns the queue error when dequeueing fails. Acknowledgement
    /// failures are logged, not returned.
    pub async fn drain_once(&self) -> WorkQueueResult<Option<ProcessOutcome>> {
        let Some(delivery) = self.queue.dequeue().await? else {
            return Ok(None);
        };
        debug!(
            message_id = %delivery.message_id(),
            dequeue_count = delivery.dequeue_count(),
            "archive message received"
        );

        let outcome = self.processor.process(delivery.body()).await;

        if let Err(err) = self.queue.acknowledge(&delivery).await {
            warn!(
                message_id = %delivery.message_id(),
                error = %err,
                "acknowledgement failed; message will be redelivered"
            );
        }
        Ok(Some(outcome))
    }

    /// Runs until `shutdown` reads `true` or its sender is dropped.
    ///
    /// The signal is checked between deliveries only.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(poll_interval = ?self.poll_interval, "archive worker started");
        loop {
            let stop_requested = *shutdown.borrow_and_update();
            if stop_requested {
                break;
            }
            let idle = match self.drain_once().await {
                Ok(handled) => handled.is_none(),
                Err(err) => {
                    warn!(error = %err, "work queue poll failed");
                    true
                }
            };
            if !idle {
                continue;
            }
            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("archive worker stopped");
    }
}
