//! API Module
//!
//! HTTP surface of the headless worker host.
//!
//! # Endpoints
//! - `* /*` - Any other path is proxied through the worker
//! - `GET /__worker/health` - Health check endpoint
//! - `GET /__worker/stats` - Cache and queue statistics
//! - `GET /__worker/caches` - Partitions with entry counts
//! - `GET|POST /__worker/queue` - List or append queued writes
//! - `POST /__worker/install`, `POST /__worker/activate` - Lifecycle events
//! - `POST /__worker/sync/:tag` - Deferred-sync trigger
//! - `POST /__worker/push` - Push message
//! - `GET /__worker/notifications` - Displayed notifications
//! - `POST /__worker/notifications/:index/click` - Notification activation

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
