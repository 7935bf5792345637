//! GitHub REST client.
//!
//! Requests go through the [`Transport`] trait so the HTTP stack can be
//! swapped (the blocking reqwest client in production, an in-memory double
//! in tests). [`GithubClient`] turns non-2xx answers into typed
//! [`UpstreamError::Status`] values carrying the real status code.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, UpstreamError};

mod http;
mod types;

pub use http::HttpTransport;
pub use types::{GithubUser, RateLimitStatus};

use types::{ErrorBody, RateLimitResponse};

/// A single request against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    pub method: Method,
    /// Path and query, starting with `/`.
    pub path: String,
    /// Access token sent as bearer credential.
    pub token: &'a str,
    pub body: Option<Value>,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, path: impl Into<String>, token: &'a str) -> Self {
        Self {
            method,
            path: path.into(),
            token,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A raw response, whatever its status.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// `x-ratelimit-remaining` header.
    pub rate_limit_remaining: Option<u64>,
    /// `retry-after` header, in seconds.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the quota headers or the error body report a rate limit.
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limit_remaining == Some(0)
            || self.retry_after.is_some()
            || self.error_body().is_some_and(|b| b.names_rate_limit())
    }

    /// GitHub's `message` field, or the raw body when it is not JSON.
    pub fn message(&self) -> String {
        self.error_body()
            .map(|b| b.message)
            .unwrap_or_else(|| self.body.trim().to_string())
    }

    fn error_body(&self) -> Option<ErrorBody> {
        serde_json::from_str(&self.body).ok()
    }

    /// Deserialize the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()).into())
    }
}

/// HTTP transport abstraction.
///
/// Implementations return `Ok` for every HTTP answer, including error
/// statuses; `Err` is reserved for failing to get an answer at all.
pub trait Transport {
    fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse> {
        (**self).send(request)
    }
}

/// Typed GitHub client over a shared transport.
pub struct GithubClient<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for GithubClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> GithubClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request, mapping non-2xx statuses to [`UpstreamError::Status`].
    pub fn execute(&self, request: ApiRequest<'_>) -> Result<ApiResponse> {
        debug!(method = %request.method, path = %request.path, "github request");
        let response = self.transport.send(&request)?;

        if response.is_success() {
            debug!(status = response.status, path = %request.path, "github response");
            return Ok(response);
        }

        let err = UpstreamError::status(response.status, response.is_rate_limited(), response.message());
        if response.status == 404 {
            debug!(path = %request.path, "github resource not found");
        } else {
            warn!(status = response.status, path = %request.path, error = %err, "github request failed");
        }
        Err(err.into())
    }

    pub fn get<R: DeserializeOwned>(&self, token: &str, path: &str) -> Result<R> {
        self.execute(ApiRequest::new(Method::GET, path, token))?.json()
    }

    /// PUT a JSON body, returning the success status (201 or 204 on GitHub).
    pub fn put(&self, token: &str, path: &str, body: Value) -> Result<u16> {
        let response = self.execute(ApiRequest::new(Method::PUT, path, token).with_body(body))?;
        Ok(response.status)
    }

    /// DELETE, returning the success status.
    pub fn delete(&self, token: &str, path: &str) -> Result<u16> {
        let response = self.execute(ApiRequest::new(Method::DELETE, path, token))?;
        Ok(response.status)
    }

    /// `GET /user`
    pub fn user(&self, token: &str) -> Result<GithubUser> {
        self.get(token, "/user")
    }

    /// `GET /rate_limit`, core quota only.
    pub fn rate_limit(&self, token: &str) -> Result<RateLimitStatus> {
        let response: RateLimitResponse = self.get(token, "/rate_limit")?;
        Ok(response.rate)
    }
}
