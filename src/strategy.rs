//! Cache Strategy Engine
//!
//! The four ways a request can be answered from a partition and the network.
//! Every strategy writes through only on a 2xx response, and always stores a
//! clone so the caller receives the same bytes the partition keeps.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::CacheStorage;
use crate::error::{Result, WorkerError};
use crate::message::{Request, Response};
use crate::net::Fetcher;

/// Speculative response the platform started fetching for a navigation.
/// Resolves to `None` when no preload happened.
pub type PreloadResponse = BoxFuture<'static, Option<Response>>;

/// Background work that must finish before the platform may tear the worker down.
pub type WaitUntil = JoinHandle<Result<Response>>;

/// The response handed back to the page, plus any work still running.
#[derive(Debug)]
pub struct Outcome {
    pub response: Response,
    pub wait_until: Option<WaitUntil>,
}

impl Outcome {
    pub fn ready(response: Response) -> Self {
        Self {
            response,
            wait_until: None,
        }
    }

    /// Waits for background work, then returns the response.
    pub async fn settle(self) -> Response {
        if let Some(handle) = self.wait_until {
            let _ = handle.await;
        }
        self.response
    }
}

async fn store_if_success(
    storage: &CacheStorage,
    partition: &str,
    request: &Request,
    response: &Response,
) -> Result<()> {
    if response.is_success() {
        storage.put(partition, request, response.clone()).await?;
    }
    Ok(())
}

// == Cache First ==
/// Serves a cached match without touching the network; otherwise fetches
/// and stores a successful response.
pub async fn cache_first(
    storage: &CacheStorage,
    partition: &str,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> Result<Outcome> {
    if let Some(hit) = storage.match_in(partition, request).await {
        return Ok(Outcome::ready(hit));
    }

    let response = fetcher.fetch(request).await?;
    store_if_success(storage, partition, request, &response).await?;
    Ok(Outcome::ready(response))
}

// == Network First ==
/// Prefers the network; on transport failure serves the cached match, then
/// whatever `fallback` produces.
pub async fn network_first<F, Fut>(
    storage: &CacheStorage,
    partition: &str,
    fetcher: &dyn Fetcher,
    request: &Request,
    fallback: F,
) -> Result<Outcome>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<Response>>,
{
    match fetcher.fetch(request).await {
        Ok(response) => {
            store_if_success(storage, partition, request, &response).await?;
            Ok(Outcome::ready(response))
        }
        Err(err) => {
            debug!(url = %request.url, error = %err, "Network failed, trying cache");
            if let Some(hit) = storage.match_in(partition, request).await {
                return Ok(Outcome::ready(hit));
            }
            fallback().await.map(Outcome::ready).ok_or(err)
        }
    }
}

// == Stale While Revalidate ==
/// Serves the cached match immediately while a background fetch refreshes it.
///
/// With no cached match the caller waits for the network; if that fails the
/// partition is consulted once more before giving up.
pub async fn stale_while_revalidate(
    storage: &CacheStorage,
    partition: &str,
    fetcher: Arc<dyn Fetcher>,
    request: &Request,
) -> Result<Outcome> {
    let cached = storage.match_in(partition, request).await;
    let revalidation = tokio::spawn(revalidate(
        storage.clone(),
        partition.to_string(),
        fetcher,
        request.clone(),
    ));

    if let Some(hit) = cached {
        return Ok(Outcome {
            response: hit,
            wait_until: Some(revalidation),
        });
    }

    match revalidation.await {
        Ok(Ok(response)) => Ok(Outcome::ready(response)),
        Ok(Err(err)) => storage
            .match_in(partition, request)
            .await
            .map(Outcome::ready)
            .ok_or(err),
        Err(join) => Err(WorkerError::Internal(join.to_string())),
    }
}

async fn revalidate(
    storage: CacheStorage,
    partition: String,
    fetcher: Arc<dyn Fetcher>,
    request: Request,
) -> Result<Response> {
    match fetcher.fetch(&request).await {
        Ok(response) => {
            store_if_success(&storage, &partition, &request, &response).await?;
            Ok(response)
        }
        Err(err) => {
            debug!(url = %request.url, error = %err, "Revalidation failed");
            Err(err)
        }
    }
}

// == Network First With Preload ==
/// Network-first, except a speculative preload response is used in place of
/// a fresh fetch when the platform supplies one.
pub async fn network_first_with_preload<F, Fut>(
    storage: &CacheStorage,
    partition: &str,
    fetcher: &dyn Fetcher,
    request: &Request,
    preload: Option<PreloadResponse>,
    fallback: F,
) -> Result<Outcome>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<Response>>,
{
    if let Some(preload) = preload {
        if let Some(response) = preload.await {
            debug!(url = %request.url, "Using preloaded navigation response");
            store_if_success(storage, partition, request, &response).await?;
            return Ok(Outcome::ready(response));
        }
    }

    network_first(storage, partition, fetcher, request, fallback).await
}
