//! Push message rendering and notification click routing.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::platform::{Notification, Platform, WindowClient};

/// Fallback values for fields a push message leaves out.
#[derive(Debug, Clone)]
pub struct PushDefaults {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
}

impl PushDefaults {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            title: config.site_name.clone(),
            body: config.push_default_body.clone(),
            url: "/".to_string(),
            icon: config.notification_icon.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
}

/// Decoded push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl NotificationPayload {
    /// Decodes a push body. Missing fields take their default; a missing or
    /// malformed body yields all defaults.
    pub fn parse(data: Option<&[u8]>, defaults: &PushDefaults) -> Self {
        let raw = match data {
            Some(bytes) => serde_json::from_slice::<RawPayload>(bytes).unwrap_or_else(|e| {
                warn!(error = %e, "Malformed push payload, using defaults");
                RawPayload::default()
            }),
            None => RawPayload::default(),
        };

        Self {
            title: raw.title.unwrap_or_else(|| defaults.title.clone()),
            body: raw.body.unwrap_or_else(|| defaults.body.clone()),
            url: raw.url.unwrap_or_else(|| defaults.url.clone()),
        }
    }

    pub fn into_notification(self, icon: &str) -> Notification {
        Notification {
            title: self.title,
            body: self.body,
            icon: icon.to_string(),
            badge: icon.to_string(),
            data_url: self.url,
        }
    }
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Focused(WindowClient),
    Opened(WindowClient),
}

/// Renders and displays a push message.
pub async fn on_push(
    platform: &dyn Platform,
    data: Option<&[u8]>,
    defaults: &PushDefaults,
) -> Result<Notification> {
    let notification = NotificationPayload::parse(data, defaults).into_notification(&defaults.icon);
    platform.show_notification(&notification).await?;
    Ok(notification)
}

/// Closes the notification, then focuses an open window already showing the
/// target or opens a new one.
pub async fn on_notification_click(
    platform: &dyn Platform,
    notification: &Notification,
) -> Result<ClickAction> {
    platform.close_notification(notification).await?;

    let target = &notification.data_url;
    let existing = platform
        .window_clients()
        .await?
        .into_iter()
        .find(|client| client.url.contains(target.as_str()));

    match existing {
        Some(client) => {
            debug!(client = %client.id, "Focusing existing window for notification");
            platform.focus(&client).await?;
            Ok(ClickAction::Focused(client))
        }
        None => Ok(ClickAction::Opened(platform.open_window(target).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessPlatform;

    fn defaults() -> PushDefaults {
        PushDefaults::from_config(&WorkerConfig::default())
    }

    #[test]
    fn test_parse_none_uses_defaults() {
        let payload = NotificationPayload::parse(None, &defaults());
        assert_eq!(payload.title, "PropertyHub");
        assert_eq!(payload.body, "You have a new update");
        assert_eq!(payload.url, "/");
    }

    #[test]
    fn test_parse_full_payload() {
        let data = br#"{"title":"Rent due","body":"Unit 4B","url":"/payments"}"#;
        let payload = NotificationPayload::parse(Some(data), &defaults());
        assert_eq!(
            payload,
            NotificationPayload {
                title: "Rent due".into(),
                body: "Unit 4B".into(),
                url: "/payments".into(),
            }
        );
    }

    #[test]
    fn test_parse_partial_payload_fills_missing_fields() {
        let payload = NotificationPayload::parse(Some(br#"{"title":"Lease signed"}"#), &defaults());
        assert_eq!(payload.title, "Lease signed");
        assert_eq!(payload.body, "You have a new update");
        assert_eq!(payload.url, "/");
    }

    #[test]
    fn test_parse_malformed_payload_uses_defaults() {
        for data in [&b"not json"[..], b"[1,2,3]", b"{\"title\": 7}", b""] {
            let payload = NotificationPayload::parse(Some(data), &defaults());
            assert_eq!(payload.title, "PropertyHub");
            assert_eq!(payload.url, "/");
        }
    }

    #[tokio::test]
    async fn test_on_push_shows_notification() {
        let platform = HeadlessPlatform::new();
        let shown = on_push(&platform, None, &defaults()).await.unwrap();

        assert_eq!(shown.icon, "/icons/icon-192x192.png");
        assert_eq!(shown.badge, shown.icon);
        assert_eq!(platform.notifications().await, vec![shown]);
    }

    #[tokio::test]
    async fn test_click_opens_window_when_none_match() {
        let platform = HeadlessPlatform::new();
        let shown = on_push(&platform, Some(br#"{"url":"/maintenance"}"#), &defaults())
            .await
            .unwrap();

        let action = on_notification_click(&platform, &shown).await.unwrap();

        match action {
            ClickAction::Opened(client) => assert_eq!(client.url, "/maintenance"),
            other => panic!("expected Opened, got {:?}", other),
        }
        assert!(platform.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_focuses_matching_window() {
        let platform = HeadlessPlatform::new();
        let window = platform
            .open_window("http://localhost:3000/maintenance?open=1")
            .await
            .unwrap();
        let shown = on_push(&platform, Some(br#"{"url":"/maintenance"}"#), &defaults())
            .await
            .unwrap();

        let action = on_notification_click(&platform, &shown).await.unwrap();

        assert_eq!(action, ClickAction::Focused(window));
        assert_eq!(platform.window_clients().await.unwrap().len(), 1);
    }
}
