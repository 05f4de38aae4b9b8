//! Durable queue of writes made while offline.

mod item;
mod store;


pub use item::{timestamp, OperationType, QueueItem};
pub use store::{MalformedItem, StoredItem, WriteQueue, QUEUE_STORE_NAME, QUEUE_STORE_VERSION};
