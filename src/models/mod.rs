//! Request and Response models for the worker host API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing `/__worker` request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::EnqueueRequest;
pub use responses::{
    ActivateResponse, CachesResponse, ClickResponse, EnqueueResponse, ErrorResponse,
    HealthResponse, InstallResponse, NotificationsResponse, PartitionSummary, QueueResponse,
    StatsResponse, SyncResponse,
};
