//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sync trigger: drains the write queue at a fixed interval

mod sync;

pub use sync::spawn_sync_task;
