//! Cache Maintenance
//!
//! Count-based eviction over a single partition. Victims are chosen by
//! insertion order, not by access recency.

use tracing::debug;

use crate::cache::CacheStorage;
use crate::error::{Result, WorkerError};

/// Trims `partition` down to at most `max_entries`, removing the oldest writes.
///
/// Returns the number of entries removed. A partition that does not exist
/// has nothing to trim.
pub async fn trim(storage: &CacheStorage, partition: &str, max_entries: usize) -> Result<usize> {
    let keys = match storage.entries(partition).await {
        Ok(keys) => keys,
        Err(WorkerError::PartitionNotFound(_)) => return Ok(0),
        Err(e) => return Err(e),
    };

    if keys.len() <= max_entries {
        return Ok(0);
    }

    let excess = keys.len() - max_entries;
    let mut removed = 0;
    for key in keys.iter().take(excess) {
        if storage.remove_entry(partition, key).await? {
            removed += 1;
        }
    }

    storage.record_evictions(removed).await;
    debug!(partition = %partition, removed, max_entries, "Trimmed partition");
    Ok(removed)
}
