//! Cache Store Module
//!
//! Named, versioned partitions of request/response pairs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};
use crate::error::{Result, WorkerError};
use crate::message::{Request, RequestKey, Response};

// == Partition ==
/// One named bucket holding responses for a single traffic class.
#[derive(Debug, Default)]
pub struct Partition {
    entries: HashMap<RequestKey, CacheEntry>,
    order: InsertionOrder,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a response, replacing any previous one for the key.
    pub fn put(&mut self, key: RequestKey, response: Response) {
        self.order.record_write(&key);
        self.entries
            .insert(key.clone(), CacheEntry::new(key, response));
    }

    pub fn get(&self, key: &RequestKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Returns true if an entry was removed.
    pub fn remove(&mut self, key: &RequestKey) -> bool {
        self.order.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct StorageInner {
    partitions: BTreeMap<String, Partition>,
    stats: CacheStats,
}

// == Cache Storage ==
/// Handle to the set of partitions.
///
/// Cloning the handle shares the underlying storage; the worker never holds
/// partition references across calls, every lookup goes through a name.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    inner: Arc<RwLock<StorageInner>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Opens a partition, creating it if it does not exist.
    pub async fn open(&self, name: &str) {
        let mut inner = self.inner.write().await;
        if !inner.partitions.contains_key(name) {
            debug!(partition = %name, "Creating partition");
            inner.partitions.insert(name.to_string(), Partition::new());
        }
    }

    pub async fn has(&self, name: &str) -> bool {
        self.inner.read().await.partitions.contains_key(name)
    }

    /// Names of every existing partition.
    pub async fn keys(&self) -> Vec<String> {
        self.inner.read().await.partitions.keys().cloned().collect()
    }

    // == Delete ==
    /// Removes a whole partition. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> bool {
        self.inner.write().await.partitions.remove(name).is_some()
    }

    // == Match ==
    /// Looks up a request in one partition.
    pub async fn match_in(&self, name: &str, request: &Request) -> Option<Response> {
        let key = request.key()?;
        let mut inner = self.inner.write().await;
        let found = inner
            .partitions
            .get(name)
            .and_then(|p| p.get(&key))
            .map(|entry| entry.response.clone());

        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        found
    }

    // == Put ==
    /// Stores a response in a partition, creating the partition if needed.
    ///
    /// Only GET requests are cacheable.
    pub async fn put(&self, name: &str, request: &Request, response: Response) -> Result<()> {
        let key = RequestKey::cacheable(request)?;
        let mut inner = self.inner.write().await;
        inner
            .partitions
            .entry(name.to_string())
            .or_default()
            .put(key, response);
        inner.stats.record_store();
        Ok(())
    }

    // == Entries ==
    /// Request keys stored in a partition, oldest write first.
    pub async fn entries(&self, name: &str) -> Result<Vec<RequestKey>> {
        self.inner
            .read()
            .await
            .partitions
            .get(name)
            .map(Partition::keys)
            .ok_or_else(|| WorkerError::PartitionNotFound(name.to_string()))
    }

    /// Removes one entry. Returns false if it was absent.
    pub async fn remove_entry(&self, name: &str, key: &RequestKey) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let partition = inner
            .partitions
            .get_mut(name)
            .ok_or_else(|| WorkerError::PartitionNotFound(name.to_string()))?;
        Ok(partition.remove(key))
    }

    /// Number of entries in a partition (0 if absent).
    pub async fn len(&self, name: &str) -> usize {
        self.inner
            .read()
            .await
            .partitions
            .get(name)
            .map_or(0, Partition::len)
    }

    pub(crate) async fn record_evictions(&self, count: usize) {
        self.inner.write().await.stats.record_evictions(count);
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.partitions = inner.partitions.len();
        stats.total_entries = inner.partitions.values().map(Partition::len).sum();
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use url::Url;

    fn get(path: &str) -> Request {
        Request::get(Url::parse(&format!("http://localhost:3000{}", path)).unwrap())
    }

    #[tokio::test]
    async fn test_open_creates_partition() {
        let storage = CacheStorage::new();
        storage.open("static-v1").await;

        assert!(storage.has("static-v1").await);
        assert_eq!(storage.keys().await, vec!["static-v1"]);
        assert_eq!(storage.len("static-v1").await, 0);
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = CacheStorage::new();
        let request = get("/properties");

        storage
            .put("runtime-v1", &request, Response::new(StatusCode::OK, "list"))
            .await
            .unwrap();

        let found = storage.match_in("runtime-v1", &request).await.unwrap();
        assert_eq!(found.body, b"list");
        assert!(storage.match_in("api-v1", &request).await.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let storage = CacheStorage::new();
        let request = get("/properties");

        storage
            .put("runtime-v1", &request, Response::new(StatusCode::OK, "old"))
            .await
            .unwrap();
        storage
            .put("runtime-v1", &request, Response::new(StatusCode::OK, "new"))
            .await
            .unwrap();

        assert_eq!(storage.len("runtime-v1").await, 1);
        let found = storage.match_in("runtime-v1", &request).await.unwrap();
        assert_eq!(found.body, b"new");
    }

    #[tokio::test]
    async fn test_put_rejects_post() {
        let storage = CacheStorage::new();
        let request = Request::post_json(
            Url::parse("http://localhost:3000/api/leases").unwrap(),
            b"{}".to_vec(),
        );

        let result = storage
            .put("api-v1", &request, Response::new(StatusCode::OK, ""))
            .await;
        assert!(matches!(result, Err(WorkerError::NotCacheable(_))));
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let storage = CacheStorage::new();
        storage.open("runtime-v1").await;

        assert!(storage.delete("runtime-v1").await);
        assert!(!storage.delete("runtime-v1").await);
        assert!(storage.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_entries_in_insertion_order() {
        let storage = CacheStorage::new();
        for path in ["/a", "/b", "/c"] {
            storage
                .put("runtime-v1", &get(path), Response::new(StatusCode::OK, path))
                .await
                .unwrap();
        }

        let urls: Vec<String> = storage
            .entries("runtime-v1")
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:3000/a",
                "http://localhost:3000/b",
                "http://localhost:3000/c"
            ]
        );
    }

    #[tokio::test]
    async fn test_entries_missing_partition() {
        let storage = CacheStorage::new();
        assert!(matches!(
            storage.entries("nope").await,
            Err(WorkerError::PartitionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let storage = CacheStorage::new();
        let request = get("/a");
        storage
            .put("runtime-v1", &request, Response::new(StatusCode::OK, "a"))
            .await
            .unwrap();
        let key = request.key().unwrap();

        assert!(storage.remove_entry("runtime-v1", &key).await.unwrap());
        assert!(!storage.remove_entry("runtime-v1", &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let storage = CacheStorage::new();
        let request = get("/a");
        storage
            .put("runtime-v1", &request, Response::new(StatusCode::OK, "a"))
            .await
            .unwrap();
        storage.match_in("runtime-v1", &request).await;
        storage.match_in("runtime-v1", &get("/missing")).await;

        let stats = storage.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stores, 1);
        assert_eq!(stats.partitions, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
