//! Request Router
//!
//! Classifies intercepted GET requests and answers them with the matching
//! strategy, partition and maintenance pass. Failures never escape: every
//! route ends in a response, synthesized if need be.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::cache::{trim, CacheStorage};
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::message::{Request, Response};
use crate::net::Fetcher;
use crate::strategy::{self, Outcome, PreloadResponse};

/// Build-output static directory.
const STATIC_DIR: &str = "/_next/static/";

const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "otf",
];

/// Local API prefix.
const API_PREFIX: &str = "/api/";

/// Traffic class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Cache-first over the static partition
    StaticAsset,
    /// Stale-while-revalidate over the API partition, then trim
    Api,
    /// Stale-while-revalidate over the last-viewed partition
    Detail,
    /// Network-first with preload over the runtime partition, then trim
    Navigation,
    /// Stale-while-revalidate over the runtime partition
    Runtime,
}

/// Classifies a request. `None` means the worker does not handle it.
///
/// Order matters: a URL can satisfy several predicates and the first wins.
pub fn classify(request: &Request, config: &WorkerConfig) -> Option<Route> {
    request.key()?;

    let url = &request.url;
    if is_static_asset(url) {
        Some(Route::StaticAsset)
    } else if is_api(url, config) {
        Some(Route::Api)
    } else if is_detail(url.path(), &config.detail_route_prefix) {
        Some(Route::Detail)
    } else if request.is_navigation() {
        Some(Route::Navigation)
    } else {
        Some(Route::Runtime)
    }
}

fn is_static_asset(url: &Url) -> bool {
    let path = url.path();
    if path.starts_with(STATIC_DIR) {
        return true;
    }
    path.rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_api(url: &Url, config: &WorkerConfig) -> bool {
    url.path().starts_with(API_PREFIX)
        || (url.host_str().is_some() && url.host_str() == config.api_host())
}

/// `<prefix><id>` with exactly one non-empty segment after the prefix.
fn is_detail(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => {
            let rest = rest.strip_suffix('/').unwrap_or(rest);
            !rest.is_empty() && !rest.contains('/')
        }
        None => false,
    }
}

/// Dispatches classified requests to strategies.
#[derive(Clone)]
pub struct RequestRouter {
    config: Arc<WorkerConfig>,
    caches: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
}

impl RequestRouter {
    pub fn new(config: Arc<WorkerConfig>, caches: CacheStorage, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            caches,
            fetcher,
        }
    }

    /// Answers a request, or returns `None` to let it pass through untouched.
    pub async fn dispatch(
        &self,
        request: &Request,
        preload: Option<PreloadResponse>,
    ) -> Option<Outcome> {
        let route = classify(request, &self.config)?;
        debug!(url = %request.url, ?route, "Routing request");

        let outcome = match route {
            Route::StaticAsset => {
                let partition = self.config.static_partition();
                strategy::cache_first(&self.caches, &partition, self.fetcher.as_ref(), request)
                    .await
                    .unwrap_or_else(|e| offline(request, e, Response::offline_page()))
            }
            Route::Api => {
                let partition = self.config.api_partition();
                match strategy::stale_while_revalidate(
                    &self.caches,
                    &partition,
                    self.fetcher.clone(),
                    request,
                )
                .await
                {
                    Ok(outcome) => {
                        self.then_trim(outcome, partition, self.config.api_max_entries)
                            .await
                    }
                    Err(e) => offline(request, e, Response::offline_api()),
                }
            }
            Route::Detail => {
                let partition = self.config.last_viewed_partition();
                strategy::stale_while_revalidate(
                    &self.caches,
                    &partition,
                    self.fetcher.clone(),
                    request,
                )
                .await
                .unwrap_or_else(|e| offline(request, e, Response::offline_page()))
            }
            Route::Navigation => {
                let partition = self.config.runtime_partition();
                match strategy::network_first_with_preload(
                    &self.caches,
                    &partition,
                    self.fetcher.as_ref(),
                    request,
                    preload,
                    || self.app_shell(),
                )
                .await
                {
                    Ok(outcome) => {
                        self.then_trim(outcome, partition, self.config.runtime_max_entries)
                            .await
                    }
                    Err(e) => offline(request, e, Response::offline_page()),
                }
            }
            Route::Runtime => {
                let partition = self.config.runtime_partition();
                strategy::stale_while_revalidate(
                    &self.caches,
                    &partition,
                    self.fetcher.clone(),
                    request,
                )
                .await
                .unwrap_or_else(|e| offline(request, e, Response::offline_page()))
            }
        };

        Some(outcome)
    }

    /// The cached application-shell root, if install stored one.
    async fn app_shell(&self) -> Option<Response> {
        let root = self.config.absolute_url("/")?;
        self.caches
            .match_in(&self.config.static_partition(), &Request::get(root))
            .await
    }

    /// Runs maintenance after the outcome's own cache write has landed.
    async fn then_trim(&self, outcome: Outcome, partition: String, max_entries: usize) -> Outcome {
        let caches = self.caches.clone();
        match outcome.wait_until {
            Some(pending) => {
                let chained = tokio::spawn(async move {
                    let result = pending
                        .await
                        .unwrap_or_else(|e| Err(WorkerError::Internal(e.to_string())));
                    trim_logged(&caches, &partition, max_entries).await;
                    result
                });
                Outcome {
                    response: outcome.response,
                    wait_until: Some(chained),
                }
            }
            None => {
                trim_logged(&caches, &partition, max_entries).await;
                outcome
            }
        }
    }
}

async fn trim_logged(caches: &CacheStorage, partition: &str, max_entries: usize) {
    if let Err(e) = trim(caches, partition, max_entries).await {
        warn!(partition = %partition, error = %e, "Maintenance pass failed");
    }
}

fn offline(request: &Request, error: WorkerError, response: Response) -> Outcome {
    debug!(url = %request.url, error = %error, "Serving offline response");
    Outcome::ready(response)
}
