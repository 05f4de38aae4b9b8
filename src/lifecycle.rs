//! Lifecycle Manager
//!
//! Install seeds the static partition with the application shell. Activate
//! purges partitions from older versions, enables navigation preload,
//! starts warming the runtime partition and takes control of open pages.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::message::{Request, Response};
use crate::net::Fetcher;
use crate::platform::Platform;

/// What activation did.
#[derive(Debug)]
pub struct ActivationReport {
    /// Partitions removed because their version tag is stale
    pub deleted: Vec<String>,
    pub preload_enabled: bool,
    /// Background warming; resolves to the number of routes cached
    pub warming: JoinHandle<usize>,
}

pub struct LifecycleManager {
    config: Arc<WorkerConfig>,
    caches: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    platform: Arc<dyn Platform>,
}

impl LifecycleManager {
    pub fn new(
        config: Arc<WorkerConfig>,
        caches: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            config,
            caches,
            fetcher,
            platform,
        }
    }

    /// Fetches the whole application shell, then stores it in one pass.
    ///
    /// Any failed fetch fails install and leaves the static partition
    /// untouched. Returns the number of entries written.
    pub async fn install(&self) -> Result<usize> {
        let requests = self
            .config
            .app_shell
            .iter()
            .map(|path| {
                self.config
                    .absolute_url(path)
                    .map(Request::get)
                    .ok_or_else(|| WorkerError::InvalidRequest(format!("bad shell path: {}", path)))
            })
            .collect::<Result<Vec<_>>>()?;

        let responses = try_join_all(requests.iter().map(|request| self.fetch_shell(request))).await?;

        let partition = self.config.static_partition();
        self.caches.open(&partition).await;
        for (request, response) in requests.iter().zip(responses) {
            self.caches.put(&partition, request, response).await?;
        }
        info!(partition = %partition, entries = requests.len(), "Installed application shell");

        self.platform.skip_waiting().await?;
        Ok(requests.len())
    }

    async fn fetch_shell(&self, request: &Request) -> Result<Response> {
        let response = self.fetcher.fetch(request).await?;
        if !response.is_success() {
            return Err(WorkerError::Network(format!(
                "{} returned {}",
                request.url, response.status
            )));
        }
        Ok(response)
    }

    /// Runs the four activation steps in order. Only a failed purge or a
    /// failed claim fails activation.
    pub async fn activate(&self) -> Result<ActivationReport> {
        let deleted = self.purge_stale_partitions().await?;
        for name in self.config.partition_names() {
            self.caches.open(&name).await;
        }

        let preload_enabled = match self.platform.enable_navigation_preload().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(error = %e, "Navigation preload unavailable");
                false
            }
        };

        let warming = tokio::spawn(warm_routes(
            self.config.clone(),
            self.caches.clone(),
            self.fetcher.clone(),
        ));

        self.platform.claim_clients().await?;
        info!(deleted = deleted.len(), preload_enabled, "Worker activated");

        Ok(ActivationReport {
            deleted,
            preload_enabled,
            warming,
        })
    }

    async fn purge_stale_partitions(&self) -> Result<Vec<String>> {
        let current = self.config.partition_names();
        let stale: Vec<String> = self
            .caches
            .keys()
            .await
            .into_iter()
            .filter(|name| !current.contains(name))
            .collect();

        for name in &stale {
            self.caches.delete(name).await;
            info!(partition = %name, "Deleted stale partition");
        }

        let survivors: Vec<String> = self
            .caches
            .keys()
            .await
            .into_iter()
            .filter(|name| stale.contains(name))
            .collect();
        if !survivors.is_empty() {
            return Err(WorkerError::Storage(format!(
                "failed to delete partitions: {}",
                survivors.join(", ")
            )));
        }

        Ok(stale)
    }
}

/// Caches each warm route missing from the runtime partition. Failures are
/// logged and skipped.
async fn warm_routes(
    config: Arc<WorkerConfig>,
    caches: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
) -> usize {
    let partition = config.runtime_partition();
    let mut warmed = 0;

    for route in &config.warm_routes {
        let Some(url) = config.absolute_url(route) else {
            warn!(route = %route, "Skipping unparsable warm route");
            continue;
        };
        let request = Request::get(url);
        if caches.match_in(&partition, &request).await.is_some() {
            continue;
        }

        match fetcher.fetch(&request).await {
            Ok(response) if response.is_success() => {
                if caches.put(&partition, &request, response).await.is_ok() {
                    warmed += 1;
                }
            }
            Ok(response) => debug!(route = %route, status = %response.status, "Warm route not cached"),
            Err(e) => debug!(route = %route, error = %e, "Warm route fetch failed"),
        }
    }

    info!(warmed, partition = %partition, "Cache warming finished");
    warmed
}
