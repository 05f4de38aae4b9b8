//! The worker's event handlers.
//!
//! One method per platform event. Each takes what the event carries and
//! returns the work the platform must wait on; nothing is kept between
//! events except handles to the partition store and the write queue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::error::Result;
use crate::lifecycle::{ActivationReport, LifecycleManager};
use crate::message::Request;
use crate::net::Fetcher;
use crate::platform::{Notification, Platform};
use crate::push::{self, ClickAction, PushDefaults};
use crate::queue::{OperationType, WriteQueue};
use crate::router::RequestRouter;
use crate::strategy::{Outcome, PreloadResponse};
use crate::sync::{DrainReport, SyncCoordinator};

/// An intercepted request and the platform's speculative response, if any.
pub struct FetchEvent {
    pub request: Request,
    pub preload: Option<PreloadResponse>,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            preload: None,
        }
    }

    pub fn with_preload(mut self, preload: PreloadResponse) -> Self {
        self.preload = Some(preload);
        self
    }
}

#[derive(Clone)]
pub struct Worker {
    config: Arc<WorkerConfig>,
    caches: CacheStorage,
    queue: Arc<WriteQueue>,
    platform: Arc<dyn Platform>,
    lifecycle: Arc<LifecycleManager>,
    router: RequestRouter,
    sync: Arc<SyncCoordinator>,
    push_defaults: PushDefaults,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        caches: CacheStorage,
        queue: Arc<WriteQueue>,
        fetcher: Arc<dyn Fetcher>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        let config = Arc::new(config);
        let lifecycle = LifecycleManager::new(
            config.clone(),
            caches.clone(),
            fetcher.clone(),
            platform.clone(),
        );
        let router = RequestRouter::new(config.clone(), caches.clone(), fetcher.clone());
        let sync = SyncCoordinator::new(queue.clone(), fetcher, config.api_base_url.clone());

        Self {
            push_defaults: PushDefaults::from_config(&config),
            config,
            caches,
            queue,
            platform,
            lifecycle: Arc::new(lifecycle),
            router,
            sync: Arc::new(sync),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    // == Lifecycle ==
    pub async fn on_install(&self) -> Result<usize> {
        self.lifecycle.install().await
    }

    pub async fn on_activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    // == Fetch ==
    /// `None` means the request is not handled and goes to the network as-is.
    pub async fn on_fetch(&self, event: FetchEvent) -> Option<Outcome> {
        self.router.dispatch(&event.request, event.preload).await
    }

    // == Sync ==
    /// Drains the operation type bound to `tag`. Unknown tags are ignored.
    pub async fn on_sync(&self, tag: &str) -> Result<Option<DrainReport>> {
        let Some(operation) = OperationType::from_sync_tag(tag) else {
            warn!(tag = %tag, "Ignoring unknown sync tag");
            return Ok(None);
        };

        let report = self.sync.flush_by_type(&operation).await?;
        if report.replayed > 0 || report.needs_retry() {
            info!(
                tag = %tag,
                replayed = report.replayed,
                remaining = report.remaining,
                "Sync finished"
            );
        }
        Ok(Some(report))
    }

    /// Drains every supported operation type.
    pub async fn sync_all(&self) -> Vec<DrainReport> {
        self.sync.flush_supported().await
    }

    // == Push ==
    pub async fn on_push(&self, data: Option<&[u8]>) -> Result<Notification> {
        push::on_push(self.platform.as_ref(), data, &self.push_defaults).await
    }

    pub async fn on_notification_click(&self, notification: &Notification) -> Result<ClickAction> {
        push::on_notification_click(self.platform.as_ref(), notification).await
    }
}
