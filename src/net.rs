//! Network access.
//!
//! Strategies and the sync coordinator reach the network only through the
//! `Fetcher` trait so the host (or a test) decides what "the network" is.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::debug;

use crate::error::{Result, WorkerError};
use crate::message::{Request, Response};

/// Performs a request against the network.
///
/// An `Err` means the request never produced a response (transport failure).
/// Non-2xx statuses are returned as `Ok` responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Fetcher backed by a reqwest client.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| WorkerError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let upstream = builder
            .send()
            .await
            .map_err(|e| WorkerError::Network(e.to_string()))?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|e| WorkerError::Network(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in upstream.headers() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.append(name, value);
            }
        }

        let body = upstream
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(e.to_string()))?
            .to_vec();

        debug!(url = %request.url, status = %status, bytes = body.len(), "Fetched");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
