//! Host platform capabilities the worker depends on.
//!
//! In a browser these are the service-worker globals (skip-waiting, client
//! claiming, navigation preload, notifications, window clients). The headless
//! host implements them in-process.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Result, WorkerError};

/// A displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Page opened or focused when the notification is activated
    pub data_url: String,
}

/// An open page controlled by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Activate the new worker without waiting for older instances.
    async fn skip_waiting(&self) -> Result<()>;

    /// Turn on speculative navigation preload. `Ok(false)` when unsupported.
    async fn enable_navigation_preload(&self) -> Result<bool>;

    /// Take control of already-open pages.
    async fn claim_clients(&self) -> Result<()>;

    async fn show_notification(&self, notification: &Notification) -> Result<()>;

    async fn close_notification(&self, notification: &Notification) -> Result<()>;

    /// Open pages, including ones not yet controlled.
    async fn window_clients(&self) -> Result<Vec<WindowClient>>;

    async fn focus(&self, client: &WindowClient) -> Result<()>;

    async fn open_window(&self, url: &str) -> Result<WindowClient>;
}

#[derive(Debug, Default)]
struct HeadlessState {
    notifications: Vec<Notification>,
    windows: Vec<WindowClient>,
    claimed: bool,
}

/// In-process platform used by the proxy binary.
///
/// Notifications and windows are only recorded; navigation preload is not
/// supported.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    state: RwLock<HeadlessState>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently displayed.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    pub async fn notification(&self, index: usize) -> Result<Notification> {
        self.state
            .read()
            .await
            .notifications
            .get(index)
            .cloned()
            .ok_or_else(|| WorkerError::InvalidRequest(format!("no notification at {}", index)))
    }

    pub async fn is_claimed(&self) -> bool {
        self.state.read().await.claimed
    }
}

#[async_trait]
impl Platform for HeadlessPlatform {
    async fn skip_waiting(&self) -> Result<()> {
        info!("Worker skipping wait");
        Ok(())
    }

    async fn enable_navigation_preload(&self) -> Result<bool> {
        Ok(false)
    }

    async fn claim_clients(&self) -> Result<()> {
        self.state.write().await.claimed = true;
        info!("Worker claimed clients");
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<()> {
        info!(title = %notification.title, url = %notification.data_url, "Showing notification");
        self.state
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(pos) = state.notifications.iter().position(|n| n == notification) {
            state.notifications.remove(pos);
        }
        Ok(())
    }

    async fn window_clients(&self) -> Result<Vec<WindowClient>> {
        Ok(self.state.read().await.windows.clone())
    }

    async fn focus(&self, client: &WindowClient) -> Result<()> {
        info!(client = %client.id, url = %client.url, "Focusing window");
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient> {
        let mut state = self.state.write().await;
        let client = WindowClient {
            id: format!("window-{}", state.windows.len() + 1),
            url: url.to_string(),
        };
        state.windows.push(client.clone());
        info!(client = %client.id, url = %url, "Opened window");
        Ok(client)
    }
}
