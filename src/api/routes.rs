//! API Routes
//!
//! Configures the Axum router: admin endpoints under `/__worker`, everything
//! else through the proxy fallback.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activate_handler, caches_handler, click_handler, enqueue_handler, health_handler,
    install_handler, notifications_handler, proxy_handler, push_handler, queue_handler,
    stats_handler, sync_handler, AppState,
};

/// Path prefix reserved for the host's own endpoints.
pub const ADMIN_PREFIX: &str = "/__worker";

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/caches", get(caches_handler))
        .route("/queue", get(queue_handler).post(enqueue_handler))
        .route("/install", post(install_handler))
        .route("/activate", post(activate_handler))
        .route("/sync/:tag", post(sync_handler))
        .route("/push", post(push_handler))
        .route("/notifications", get(notifications_handler))
        .route("/notifications/:index/click", post(click_handler));

    Router::new()
        .nest(ADMIN_PREFIX, admin)
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
