//! Offline Worker - a caching and offline-sync request interceptor
//!
//! Answers page traffic from versioned cache partitions, queues writes made
//! while offline for ordered replay, and routes push notifications.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod models;
pub mod net;
pub mod platform;
pub mod push;
pub mod queue;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod tasks;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use tasks::spawn_sync_task;
pub use worker::{FetchEvent, Worker};
