//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use tokio::sync::Notify;

use offline_worker::cache::CacheStorage;
use offline_worker::message::{Request, Response};
use offline_worker::net::Fetcher;
use offline_worker::platform::HeadlessPlatform;
use offline_worker::queue::WriteQueue;
use offline_worker::{Result, Worker, WorkerConfig, WorkerError};

pub const ORIGIN: &str = "http://localhost:3000";
pub const API: &str = "https://api.propertyhub.example";

/// Network double: canned responses per URL and a connectivity switch.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (StatusCode, String)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<(Method, String)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch blocks until `gate.notify_one()`.
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
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.to_string()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Network("offline".into()));
        }

        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(match route {
            Some((status, body)) => Response::new(status, body),
            None => Response::new(StatusCode::NOT_FOUND, "not found"),
        })
    }
}

pub struct Harness {
    pub worker: Worker,
    pub caches: CacheStorage,
    pub queue: Arc<WriteQueue>,
    pub network: Arc<FakeNetwork>,
    pub platform: Arc<HeadlessPlatform>,
}

pub fn harness_with(config: WorkerConfig, network: Arc<FakeNetwork>) -> Harness {
    let caches = CacheStorage::new();
    let queue = Arc::new(WriteQueue::open_in_memory().unwrap());
    let platform = Arc::new(HeadlessPlatform::new());
    let worker = Worker::new(
        config,
        caches.clone(),
        queue.clone(),
        network.clone(),
        platform.clone(),
    );
    Harness {
        worker,
        caches,
        queue,
        network,
        platform,
    }
}

pub fn harness() -> Harness {
    harness_with(WorkerConfig::default(), Arc::new(FakeNetwork::new()))
}

pub fn site(path: &str) -> url::Url {
    url::Url::parse(&format!("{}{}", ORIGIN, path)).unwrap()
}
