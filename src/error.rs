//! Error types for the offline worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Worker Error Enum ==
/// Unified error type for the worker and its headless host.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Transport-level failure talking to the network
    #[error("Network error: {0}")]
    Network(String),

    /// Only GET requests may be stored in a partition
    #[error("Request is not cacheable: {0}")]
    NotCacheable(String),

    /// Named partition does not exist
    #[error("Partition not found: {0}")]
    PartitionNotFound(String),

    /// Partition open/write/delete failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Durable queue failure
    #[error("Queue error: {0}")]
    Queue(#[from] rusqlite::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Host platform refused or failed an operation
    #[error("Platform error: {0}")]
    Platform(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::NotCacheable(_) | WorkerError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            WorkerError::PartitionNotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkerError::Storage(_)
            | WorkerError::Queue(_)
            | WorkerError::Platform(_)
            | WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
