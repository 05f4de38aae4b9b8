//! Offline Worker - headless host
//!
//! Serves a site through the worker: page traffic is answered from cache
//! partitions or the network, and `/__worker` exposes the worker's events.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_worker::api::{create_router, AppState};
use offline_worker::{spawn_sync_task, WorkerConfig};

/// Main entry point for the worker host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the write queue and build the worker
/// 4. Run install and activate
/// 5. Start background sync task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_worker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Worker host");

    // Load configuration from environment variables
    let config = WorkerConfig::from_env();
    info!(
        "Configuration loaded: version={}, origin={}, api={}, port={}, sync_interval={}s",
        config.cache_version,
        config.origin,
        config.api_base_url,
        config.server_port,
        config.sync_interval
    );

    let state = AppState::from_config(&config).context("failed to open write queue")?;
    info!("Write queue opened at {}", config.queue_path.display());

    // Lifecycle: a failed install leaves the shell uncached but the host still proxies
    if let Err(e) = state.worker.on_install().await {
        warn!("Install failed: {}", e);
    }
    match state.worker.on_activate().await {
        Ok(report) => info!(
            "Activated: removed {} stale partitions, preload={}",
            report.deleted.len(),
            report.preload_enabled
        ),
        Err(e) => warn!("Activate failed: {}", e),
    }

    // Start background sync task
    let sync_handle = spawn_sync_task(state.worker.clone(), config.sync_interval);
    info!("Background sync task started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sync_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sync task and allows graceful shutdown.
async fn shutdown_signal(sync_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the sync task
    sync_handle.abort();
    warn!("Sync task aborted");
}
