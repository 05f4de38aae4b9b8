//! Cache Module
//!
//! Named, versioned partitions of request/response pairs plus count-based
//! maintenance.

mod entry;
pub mod maintenance;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use maintenance::trim;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::{CacheStorage, Partition};
