//! Leases, redelivery and pop receipts on `PostgresWorkQueue`.

use super::helpers::{TestDatabase, task_at, test_runtime};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tracker::task::{
    adapters::postgres::{PostgresWorkQueue, TaskPgPool},
    domain::TaskSnapshot,
    ports::{WorkQueue, WorkQueueError},
};

/// Queue whose leases expire immediately, so every dequeue redelivers.
fn expiring_queue(pool: TaskPgPool) -> PostgresWorkQueue {
    PostgresWorkQueue::with_clock(pool, Arc::new(DefaultClock), Duration::ZERO)
}

#[rstest]
fn dequeue_delivers_enqueued_snapshot(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "queue_deliver");
    let queue = PostgresWorkQueue::new(db.pool());
    let rt = test_runtime();

    let snapshot = TaskSnapshot::from(&task_at("Write report", 3));
    let message_id = rt.block_on(queue.enqueue(&snapshot)).expect("enqueue");
    let delivery = rt
        .block_on(queue.dequeue())
        .expect("dequeue")
        .expect("message should be visible");

    assert_eq!(delivery.message_id(), message_id);
    assert_eq!(delivery.dequeue_count());
    assert_eq!(
        TaskSnapshot::parse(delivery.body()).expect("body parses"),
        snapshot
    );
}

#[rstest]
fn leased_message_stays_hidden_until_timeout(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "queue_hidden");
    let queue = PostgresWorkQueue::new(db.pool());
    let rt = test_runtime();

    rt.block_on(queue.enqueue(&TaskSnapshot::from(&task_at("Write report", 1))))
        .expect("enqueue");
    rt.block_on(queue.dequeue())
        .expect("dequeue")
        .expect("first lease");

    assert!(
        rt.block_on(queue.dequeue()).expect("dequeue").is_none(),
        "leased message must not be delivered twice within its timeout"
    );
}

#[rstest]
fn expired_lease_is_redelivered_with_fresh_receipt(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "queue_redeliver");
    let queue = expiring_queue(db.pool());
    let rt = test_runtime();

    let message_id = rt
        .block_on(queue.enqueue(&TaskSnapshot::from(&task_at("Write report", 1))))
        .expect("enqueue");
    let first = rt
        .block_on(queue.dequeue())
        .expect("dequeue")
        .expect("first lease");
    let second = rt
        .block_on(queue.dequeue())
        .expect("dequeue")
        .expect("redelivery");

    assert_eq!(first.message_id(), message_id);
    assert_eq!(second.message_id(), message_id);
    assert_eq!(second.dequeue_count(), 2);
    assert_ne!(first.receipt(), second.receipt());
    assert_eq!(first.body(), second.body());
}

#[rstest]
fn stale_receipt_cannot_acknowledge_redelivered_message(
    shared_test_cluster: &'static TestCluster,
) {
    let db = TestDatabase::create(shared_test_cluster, "queue_stale_receipt");
    let queue = expiring_queue(db.pool());
    let rt = test_runtime();

    rt.block_on(queue.enqueue(&TaskSnapshot::from(&task_at("Write report", 1))))
        .expect("enqueue");
    let first = rt
        .block_on(queue.dequeue())
        .expect("dequeue")
        .expect("first lease");
    let second = rt
        .block_on(queue.dequeue())
        .expect("dequeue")
        .expect("redelivery");

    let stale = rt.block_on(queue.acknowledge(&first));
    assert!(
        matches!(
            stale,
            Err(WorkQueueError::ReceiptMismatch { message_id, receipt })
                if message_id == first.message_id() && receipt == first.receipt()
        ),
        "expected ReceiptMismatch, got {stale:?}"
    );

    rt.block_on(queue.acknowledge(&second))
        .expect("current receipt acknowledges");
    assert!(
        rt.block_on(queue.dequeue()).expect("dequeue").is_none(),
        "acknowledged message must not come back"
    );
    assert!(matches!(
        rt.block_on(queue.acknowledge(&second)),
        Err(WorkQueueError::ReceiptMismatch { .. })
    ));
}

#[rstest]
fn messages_are_leased_oldest_first(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "queue_order");
    let queue = PostgresWorkQueue::new(db.pool());
    let rt = test_runtime();

    let older = rt
        .block_on(queue.enqueue(&TaskSnapshot::from(&task_at("First", 1))))
        .expect("enqueue");
    let newer = rt
        .block_on(queue.enqueue(&TaskSnapshot::from(&task_at("Second", 1))))
        .expect("enqueue");

    let leased: Vec<_> = (0..2)
        .map(|_| {
            rt.block_on(queue.dequeue())
                .expect("dequeue")
                .expect("visible message")
                .message_id()
        })
        .collect();

    assert_eq!(leased, vec![older, newer]);
}
