//! API Handlers
//!
//! The fallback proxy that routes page traffic through the worker, plus the
//! `/__worker` endpoints that fire lifecycle, sync and push events by hand.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::message::{self, Request, RequestMode};
use crate::models::{
    ActivateResponse, CachesResponse, ClickResponse, EnqueueRequest, EnqueueResponse,
    HealthResponse, InstallResponse, NotificationsResponse, PartitionSummary, QueueResponse,
    StatsResponse, SyncResponse,
};
use crate::net::{Fetcher, HttpFetcher};
use crate::platform::{HeadlessPlatform, Notification};
use crate::queue::WriteQueue;
use crate::worker::{FetchEvent, Worker};

/// Headers that describe the upstream connection rather than the body.
const HOP_BY_HOP: [header::HeaderName; 3] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub worker: Worker,
    /// Network used for requests the worker passes through
    pub fetcher: Arc<dyn Fetcher>,
    /// Concrete platform, for inspecting notifications
    pub platform: Arc<HeadlessPlatform>,
}

impl AppState {
    /// Creates a new AppState around an existing queue and network.
    pub fn new(config: WorkerConfig, queue: Arc<WriteQueue>, fetcher: Arc<dyn Fetcher>) -> Self {
        let platform = Arc::new(HeadlessPlatform::new());
        let worker = Worker::new(
            config,
            CacheStorage::new(),
            queue,
            fetcher.clone(),
            platform.clone(),
        );
        Self {
            worker,
            fetcher,
            platform,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the durable queue and talks to the real network.
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        let queue = WriteQueue::open(&config.queue_path)?;
        Ok(Self::new(
            config.clone(),
            Arc::new(queue),
            Arc::new(HttpFetcher::new()),
        ))
    }
}

/// Fallback handler: every request outside `/__worker`.
///
/// GET requests go through the worker; anything else is forwarded as-is.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request = intercepted_request(state.worker.config(), method, &uri, headers, body)?;

    let response = match state.worker.on_fetch(FetchEvent::new(request.clone())).await {
        // pending revalidation keeps running on its own task
        Some(outcome) => outcome.response,
        None => {
            debug!(method = %request.method, url = %request.url, "Passing request through");
            state.fetcher.fetch(&request).await?
        }
    };

    Ok(into_http(response))
}

fn intercepted_request(
    config: &WorkerConfig,
    method: Method,
    uri: &Uri,
    mut headers: HeaderMap,
    body: Bytes,
) -> Result<Request> {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = config
        .absolute_url(path)
        .ok_or_else(|| WorkerError::InvalidRequest(format!("unroutable path: {}", path)))?;

    let mode = match headers.get("sec-fetch-mode") {
        Some(value) if value == "navigate" => RequestMode::Navigate,
        _ => RequestMode::Other,
    };
    headers.remove(header::HOST);

    Ok(Request {
        method,
        url,
        headers,
        mode,
        body: (!body.is_empty()).then(|| body.to_vec()),
    })
}

fn into_http(response: message::Response) -> Response {
    let mut headers = response.headers;
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    (response.status, headers, response.body).into_response()
}

/// Handler for GET /__worker/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(&state.worker.config().cache_version))
}

/// Handler for GET /__worker/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.worker.caches().stats().await;
    let queued = state.worker.queue().len()?;
    Ok(Json(StatsResponse::new(&stats, queued)))
}

/// Handler for GET /__worker/caches
pub async fn caches_handler(State(state): State<AppState>) -> Json<CachesResponse> {
    let caches = state.worker.caches();
    let mut partitions = Vec::new();
    for name in caches.keys().await {
        let entries = caches.len(&name).await;
        partitions.push(PartitionSummary { name, entries });
    }
    Json(CachesResponse { partitions })
}

/// Handler for GET /__worker/queue
pub async fn queue_handler(State(state): State<AppState>) -> Result<Json<QueueResponse>> {
    Ok(Json(QueueResponse::new(state.worker.queue().get_all()?)))
}

/// Handler for POST /__worker/queue
///
/// Stands in for a page writing to the queue after a failed mutation.
pub async fn enqueue_handler(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(WorkerError::InvalidRequest(error_msg));
    }

    let item = req.into_item();
    state.worker.queue().enqueue(&item)?;

    Ok(Json(EnqueueResponse::new(item.id)))
}

/// Handler for POST /__worker/install
pub async fn install_handler(State(state): State<AppState>) -> Result<Json<InstallResponse>> {
    let cached = state.worker.on_install().await?;
    Ok(Json(InstallResponse { cached }))
}

/// Handler for POST /__worker/activate
///
/// Responds once activation is done; warming continues in the background.
pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<ActivateResponse>> {
    let report = state.worker.on_activate().await?;
    Ok(Json(ActivateResponse {
        deleted: report.deleted,
        preload_enabled: report.preload_enabled,
    }))
}

/// Handler for POST /__worker/sync/:tag
pub async fn sync_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<SyncResponse>> {
    let report = state.worker.on_sync(&tag).await?;
    Ok(Json(SyncResponse { tag, report }))
}

/// Handler for POST /__worker/push
///
/// The raw body is the push message; an empty body means no payload.
pub async fn push_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Notification>> {
    let data = (!body.is_empty()).then_some(&body[..]);
    Ok(Json(state.worker.on_push(data).await?))
}

/// Handler for GET /__worker/notifications
pub async fn notifications_handler(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.platform.notifications().await,
    })
}

/// Handler for POST /__worker/notifications/:index/click
pub async fn click_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ClickResponse>> {
    let notification = state.platform.notification(index).await?;
    let action = state.worker.on_notification_click(&notification).await?;
    Ok(Json(ClickResponse::from(action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFetcher;
    use axum::http::StatusCode;
    use serde_json::json;

    fn test_state(fetcher: Arc<MockFetcher>) -> AppState {
        AppState::new(
            WorkerConfig::default(),
            Arc::new(WriteQueue::open_in_memory().unwrap()),
            fetcher,
        )
    }

    fn enqueue_request(id: &str) -> EnqueueRequest {
        EnqueueRequest {
            id: id.to_string(),
            kind: "maintenanceRequest".to_string(),
            endpoint: "/maintenance".to_string(),
            payload: json!({"unit": "3C"}),
            created_at: None,
        }
    }

    #[test]
    fn test_intercepted_request_detects_navigation() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", "navigate".parse().unwrap());
        headers.insert(header::HOST, "localhost:3001".parse().unwrap());
        let uri: Uri = "/properties?page=2".parse().unwrap();

        let request = intercepted_request(
            &WorkerConfig::default(),
            Method::GET,
            &uri,
            headers,
            Bytes::new(),
        )
        .unwrap();

        assert!(request.is_navigation());
        assert_eq!(request.url.as_str(), "http://localhost:3000/properties?page=2");
        assert!(request.headers.get(header::HOST).is_none());
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_proxy_passes_post_through() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("http://localhost:3000/api/leases", StatusCode::CREATED, "ok");
        let state = test_state(fetcher.clone());

        let response = proxy_handler(
            State(state),
            Method::POST,
            "/api/leases".parse().unwrap(),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(fetcher.calls()[0].2.as_deref(), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_proxy_post_offline_is_bad_gateway() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.set_offline(true);
        let state = test_state(fetcher);

        let result = proxy_handler(
            State(state),
            Method::POST,
            "/api/leases".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await;

        let response = result.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_enqueue_and_list() {
        let state = test_state(Arc::new(MockFetcher::new()));

        enqueue_handler(State(state.clone()), Json(enqueue_request("m1")))
            .await
            .unwrap();
        let listed = queue_handler(State(state)).await.unwrap();

        assert_eq!(listed.count, 1);
        assert_eq!(listed.items[0].id, "m1");
    }

    #[tokio::test]
    async fn test_enqueue_invalid_request() {
        let state = test_state(Arc::new(MockFetcher::new()));
        let result = enqueue_handler(State(state), Json(enqueue_request(""))).await;
        assert!(matches!(result, Err(WorkerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_sync_unknown_tag() {
        let state = test_state(Arc::new(MockFetcher::new()));
        let response = sync_handler(State(state), Path("sync-unknown".to_string()))
            .await
            .unwrap();
        assert!(response.report.is_none());
    }

    #[tokio::test]
    async fn test_push_then_click() {
        let state = test_state(Arc::new(MockFetcher::new()));

        let shown = push_handler(State(state.clone()), Bytes::new()).await.unwrap();
        assert_eq!(shown.title, "PropertyHub");

        let clicked = click_handler(State(state.clone()), Path(0)).await.unwrap();
        assert_eq!(clicked.action, "opened");
        assert_eq!(clicked.client.url, "/");

        let remaining = notifications_handler(State(state)).await;
        assert!(remaining.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_click_unknown_notification() {
        let state = test_state(Arc::new(MockFetcher::new()));
        assert!(click_handler(State(state), Path(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = test_state(Arc::new(MockFetcher::new()));
        let response = health_handler(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.cache_version, "v1");
    }
}
