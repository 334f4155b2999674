//! Diesel schema for task persistence and the work queue.

diesel::table! {
    /// Task records keyed by partition and row key.
    tasks (partition_key, id) {
        /// Logical shard identifier.
        #[max_length = 255]
        partition_key -> Varchar,
        /// Task identifier (row key).
        id -> Uuid,
        /// Task name.
        name -> Text,
        /// Task status.
        #[max_length = 50]
        status -> Varchar,
        /// Optional due date.
        due_date -> Nullable<Date>,
        /// Monotonic revision backing the version token.
        revision -> Int8,
    }
}

diesel::table! {
    /// Pending work queue messages.
    task_queue (id) {
        /// Message identifier.
        id -> Uuid,
        /// Raw JSON snapshot.
        body -> Text,
        /// Enqueue timestamp, used for delivery order.
        enqueued_at -> Timestamptz,
        /// The message is hidden from consumers until this instant.
        visible_at -> Timestamptz,
        /// Number of deliveries so far.
        dequeue_count -> Int4,
        /// Receipt of the current lease, if leased.
        pop_receipt -> Nullable<Uuid>,
    }
}
