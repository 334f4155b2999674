//! In-memory adapters for every task port.

mod archive;
mod queue;
mod store;

pub use archive::InMemoryArchiveStore;
pub use queue::InMemoryWorkQueue;
pub use store::InMemoryTaskStore;
