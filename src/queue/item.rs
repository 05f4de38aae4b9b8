//! Queue items and the operation types they carry.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of a queued mutating operation.
///
/// Decoded from the stored `type` string; unknown categories are kept verbatim
/// so they are never lost, but no sync tag drains them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    MaintenanceRequest,
    Payment,
    Other(String),
}

impl OperationType {
    /// Operation types that have a deferred-sync trigger.
    pub fn supported() -> [OperationType; 2] {
        [OperationType::MaintenanceRequest, OperationType::Payment]
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperationType::MaintenanceRequest => "maintenanceRequest",
            OperationType::Payment => "payment",
            OperationType::Other(s) => s,
        }
    }

    /// Deferred-sync tag that drains this type.
    pub fn sync_tag(&self) -> Option<&'static str> {
        match self {
            OperationType::MaintenanceRequest => Some("sync-maintenance-requests"),
            OperationType::Payment => Some("sync-payments"),
            OperationType::Other(_) => None,
        }
    }

    pub fn from_sync_tag(tag: &str) -> Option<Self> {
        Self::supported()
            .into_iter()
            .find(|op| op.sync_tag() == Some(tag))
    }
}

impl From<String> for OperationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "maintenanceRequest" => OperationType::MaintenanceRequest,
            "payment" => OperationType::Payment,
            _ => OperationType::Other(value),
        }
    }
}

impl From<OperationType> for String {
    fn from(value: OperationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending mutating call written by a page while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Absolute URL, or a path relative to the remote API
    pub endpoint: String,
    /// Opaque request body
    pub payload: Value,
    /// Sortable timestamp, see [`timestamp`]
    pub created_at: String,
}

impl QueueItem {
    /// Creates an item stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        kind: OperationType,
        endpoint: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            endpoint: endpoint.into(),
            payload,
            created_at: timestamp(Utc::now()),
        }
    }
}

/// RFC 3339, UTC, fixed millisecond precision: lexicographic order equals
/// chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
