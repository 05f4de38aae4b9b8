//! Cache Entry Module
//!
//! A stored request/response pair.

use chrono::{DateTime, Utc};

use crate::message::{RequestKey, Response};

// == Cache Entry ==
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity of the request the response answers
    pub key: RequestKey,
    /// The stored response
    pub response: Response,
    /// When the response was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            response,
            stored_at: Utc::now(),
        }
    }

    /// Age of the stored response in whole seconds.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.stored_at).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_entry_creation() {
        let key = RequestKey {
            method: Method::GET,
            url: "http://localhost:3000/".into(),
        };
        let entry = CacheEntry::new(key.clone(), Response::new(StatusCode::OK, "shell"));

        assert_eq!(entry.key, key);
        assert_eq!(entry.response.body, b"shell");
        assert!(entry.age_secs() <= 1);
    }
}
