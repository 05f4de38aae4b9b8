//! Sync Coordinator
//!
//! Drains the durable write queue one operation type at a time. Items are
//! replayed strictly in `created_at` order and the drain halts at the first
//! failure, leaving that item and everything after it for the next trigger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, WorkerError};
use crate::message::Request;
use crate::net::Fetcher;
use crate::queue::{OperationType, QueueItem, WriteQueue};

/// Why a drain stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum HaltReason {
    /// The request never produced a response
    Transport(String),
    /// The API answered with a non-2xx status
    Rejected(u16),
    /// The stored endpoint could not be turned into a URL
    InvalidEndpoint(String),
    /// The stored payload could not be encoded
    Encoding(String),
    /// The stored payload is not valid JSON
    Decode(String),
}

/// Per-type drain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum DrainState {
    /// Nothing left to replay
    Idle,
    /// Replaying items
    Draining,
    /// Stopped at a failed item, which stays queued
    Halted(HaltReason),
}

/// Result of one `flush_by_type` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub operation: OperationType,
    pub replayed: usize,
    pub remaining: usize,
    pub state: DrainState,
}

impl DrainReport {
    /// True when the platform should fire the trigger again later.
    pub fn needs_retry(&self) -> bool {
        matches!(self.state, DrainState::Halted(_))
    }
}

/// Replays queued writes against the API.
pub struct SyncCoordinator {
    queue: Arc<WriteQueue>,
    fetcher: Arc<dyn Fetcher>,
    api_base_url: Url,
    locks: Mutex<HashMap<OperationType, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncCoordinator {
    pub fn new(queue: Arc<WriteQueue>, fetcher: Arc<dyn Fetcher>, api_base_url: Url) -> Self {
        Self {
            queue,
            fetcher,
            api_base_url,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Drains every queued item of `operation`.
    ///
    /// Replay failures are reported through `DrainState::Halted`; only queue
    /// access failures are returned as errors.
    pub async fn flush_by_type(&self, operation: &OperationType) -> Result<DrainReport> {
        // two drains of the same type never interleave
        let lock = self.lock_for(operation);
        let _guard = lock.lock().await;

        let kind = operation.clone();
        let items = self.with_queue(move |queue| queue.get_by_type(&kind)).await?;

        let total = items.len();
        let mut replayed = 0;
        let mut state = DrainState::Draining;
        if total > 0 {
            info!(operation = %operation, pending = total, "Draining write queue");
        }

        for stored in &items {
            let item = match stored {
                Ok(item) => item,
                Err(malformed) => {
                    warn!(
                        id = %malformed.id,
                        operation = %operation,
                        error = %malformed.error,
                        "Undecodable payload, halting drain"
                    );
                    state = DrainState::Halted(HaltReason::Decode(format!(
                        "{}: {}",
                        malformed.id, malformed.error
                    )));
                    break;
                }
            };

            match self.replay(item).await {
                Ok(()) => {
                    let id = item.id.clone();
                    self.with_queue(move |queue| queue.remove(&id)).await?;
                    replayed += 1;
                    debug!(id = %item.id, operation = %operation, "Replayed queued write");
                }
                Err(reason) => {
                    warn!(id = %item.id, operation = %operation, ?reason, "Replay failed, halting drain");
                    state = DrainState::Halted(reason);
                    break;
                }
            }
        }

        if state == DrainState::Draining {
            state = DrainState::Idle;
        }

        Ok(DrainReport {
            operation: operation.clone(),
            replayed,
            remaining: total - replayed,
            state,
        })
    }

    /// Drains each supported type independently; a failure in one never
    /// blocks the others.
    pub async fn flush_supported(&self) -> Vec<DrainReport> {
        let mut reports = Vec::new();
        for operation in OperationType::supported() {
            match self.flush_by_type(&operation).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(operation = %operation, error = %e, "Drain aborted"),
            }
        }
        reports
    }

    async fn replay(&self, item: &QueueItem) -> std::result::Result<(), HaltReason> {
        let url = resolve_endpoint(&self.api_base_url, &item.endpoint)
            .map_err(|e| HaltReason::InvalidEndpoint(format!("{}: {}", item.endpoint, e)))?;
        let body = serde_json::to_vec(&item.payload)
            .map_err(|e| HaltReason::Encoding(e.to_string()))?;

        let response = self
            .fetcher
            .fetch(&Request::post_json(url, body))
            .await
            .map_err(|e| HaltReason::Transport(e.to_string()))?;

        if response.is_success() {
            Ok(())
        } else {
            Err(HaltReason::Rejected(response.status.as_u16()))
        }
    }

    /// Runs a queue call on the blocking pool.
    async fn with_queue<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&WriteQueue) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let queue = self.queue.clone();
        tokio::task::spawn_blocking(move || f(&queue))
            .await
            .map_err(|e| WorkerError::Internal(format!("Queue task failed: {}", e)))?
    }

    fn lock_for(&self, operation: &OperationType) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(operation.clone()).or_default().clone()
    }
}

/// Absolute endpoints are used as-is; relative ones are prefixed with the
/// remote API base.
pub fn resolve_endpoint(api_base_url: &Url, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = api_base_url.as_str().trim_end_matches('/');
            let path = endpoint.trim_start_matches('/');
            Url::parse(&format!("{}/{}", base, path))
        }
        Err(e) => Err(e),
    }
}
