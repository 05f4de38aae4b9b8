//! Request DTOs for the worker host API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::queue::{timestamp, OperationType, QueueItem};

const MAX_ID_LEN: usize = 256;

/// Request body for a page-side enqueue (POST /__worker/queue)
///
/// Mirrors the queue item contract. `createdAt` must be RFC 3339; it is
/// rewritten in UTC with millisecond precision so stored timestamps sort
/// chronologically, and stamped on arrival when the page leaves it out.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub endpoint: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl EnqueueRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.id.is_empty() {
            return Some("Id cannot be empty".to_string());
        }
        if self.id.len() > MAX_ID_LEN {
            return Some(format!("Id exceeds maximum length of {} characters", MAX_ID_LEN));
        }
        if self.kind.is_empty() {
            return Some("Type cannot be empty".to_string());
        }
        if self.endpoint.is_empty() {
            return Some("Endpoint cannot be empty".to_string());
        }
        if let Some(Err(e)) = self.parsed_created_at() {
            return Some(format!("createdAt is not an RFC 3339 timestamp: {}", e));
        }
        None
    }

    /// Builds the queue item. Call `validate` first; an unparsable
    /// `createdAt` is replaced by the arrival time.
    pub fn into_item(self) -> QueueItem {
        let created_at = match self.parsed_created_at() {
            Some(Ok(at)) => at.with_timezone(&Utc),
            _ => Utc::now(),
        };

        QueueItem {
            id: self.id,
            kind: OperationType::from(self.kind),
            endpoint: self.endpoint,
            payload: self.payload,
            created_at: timestamp(created_at),
        }
    }

    fn parsed_created_at(&self) -> Option<chrono::ParseResult<DateTime<FixedOffset>>> {
        self.created_at.as_deref().map(DateTime::parse_from_rfc3339)
    }
}
