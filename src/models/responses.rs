//! Response DTOs for the worker host API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::platform::{Notification, WindowClient};
use crate::push::ClickAction;
use crate::queue::QueueItem;
use crate::sync::DrainReport;

/// Response body for the health endpoint (GET /__worker/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Version tag of the active partitions
    pub cache_version: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache_version: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            cache_version: cache_version.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the stats endpoint (GET /__worker/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
    pub partitions: usize,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Writes still waiting for replay
    pub queued_writes: usize,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, queued_writes: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            evictions: stats.evictions,
            partitions: stats.partitions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            queued_writes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
}

/// Response body for GET /__worker/caches
#[derive(Debug, Clone, Serialize)]
pub struct CachesResponse {
    pub partitions: Vec<PartitionSummary>,
}

/// Response body for GET /__worker/queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueResponse {
    pub count: usize,
    pub items: Vec<QueueItem>,
}

impl QueueResponse {
    pub fn new(items: Vec<QueueItem>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Response body for POST /__worker/queue
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueResponse {
    pub message: String,
    pub id: String,
}

impl EnqueueResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Write '{}' queued", id),
            id,
        }
    }
}

/// Response body for POST /__worker/install
#[derive(Debug, Clone, Serialize)]
pub struct InstallResponse {
    /// Application-shell entries stored
    pub cached: usize,
}

/// Response body for POST /__worker/activate
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub deleted: Vec<String>,
    pub preload_enabled: bool,
}

/// Response body for POST /__worker/sync/:tag
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub tag: String,
    /// `None` when the tag is not bound to an operation type
    pub report: Option<DrainReport>,
}

/// Response body for GET /__worker/notifications
#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

/// Response body for POST /__worker/notifications/:index/click
#[derive(Debug, Clone, Serialize)]
pub struct ClickResponse {
    /// "focused" or "opened"
    pub action: String,
    pub client: WindowClient,
}

impl From<ClickAction> for ClickResponse {
    fn from(action: ClickAction) -> Self {
        match action {
            ClickAction::Focused(client) => Self {
                action: "focused".to_string(),
                client,
            },
            ClickAction::Opened(client) => Self {
                action: "opened".to_string(),
                client,
            },
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
