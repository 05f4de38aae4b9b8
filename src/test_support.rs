//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use tokio::sync::Notify;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::message::{Request, Response};
use crate::net::Fetcher;

/// Scriptable network: fixed responses per URL, an on/off switch, and an
/// optional gate that holds every fetch until released.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: Mutex<Vec<(Method, String, Option<Vec<u8>>)>>,
    gate: Option<Arc<Notify>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits for `gate.notify_one()` before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::new(status, body));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Method, String, Option<Vec<u8>>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.lock().unwrap().push((
            request.method.clone(),
            request.url.to_string(),
            request.body.clone(),
        ));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Network("network unreachable".into()));
        }

        let found = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(found.unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}
