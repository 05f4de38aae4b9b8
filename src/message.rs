//! Request and response values flowing through the worker.
//!
//! Bodies are plain byte buffers, so a response is consumed by moving it and
//! stored by cloning it.

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::error::{Result, WorkerError};

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Subresource, fetch/XHR, or anything else
    Other,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub mode: RequestMode,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a GET request for the given URL.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            mode: RequestMode::Other,
            body: None,
        }
    }

    /// Creates a navigation GET request for the given URL.
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Creates a JSON POST request.
    pub fn post_json(url: Url, body: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            method: Method::POST,
            url,
            headers,
            mode: RequestMode::Other,
            body: Some(body),
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Identity used by partitions; `None` for anything but GET.
    pub fn key(&self) -> Option<RequestKey> {
        RequestKey::for_request(self)
    }
}

/// Identity of a cached request: method plus URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl RequestKey {
    pub fn for_request(request: &Request) -> Option<Self> {
        if request.method != Method::GET {
            return None;
        }
        Some(Self {
            method: Method::GET,
            url: request.url.to_string(),
        })
    }

    /// Like `for_request`, but rejects non-GET requests with an error.
    pub fn cacheable(request: &Request) -> Result<Self> {
        Self::for_request(request).ok_or_else(|| {
            WorkerError::NotCacheable(format!("{} {}", request.method, request.url))
        })
    }
}

/// A network or cached response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body and matching content type.
    pub fn json(status: StatusCode, value: &Value) -> Self {
        let mut response = Self::new(status, value.to_string());
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }

    /// Synthesized body for an API request with no network and no cache.
    pub fn offline_api() -> Self {
        Self::json(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({
                "error": "offline",
                "message": "No cached data available"
            }),
        )
    }

    /// Last-resort body for pages and assets.
    pub fn offline_page() -> Self {
        let mut response = Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "You are offline and this page is not cached.",
        );
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
