//! Blocking HTTP transport.
//!
//! One reqwest client per access token, kept for connection reuse. Clients
//! are keyed by the token's SHA-256 digest so the token itself is never a
//! map key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::{ApiRequest, ApiResponse, Transport};
use crate::core::constants::{self, GITHUB_ACCEPT, GITHUB_API_VERSION};
use crate::error::{ConfigError, Result, UpstreamError, ValidationError};

type TokenDigest = [u8; 32];

/// reqwest-backed [`Transport`] with a per-token session cache.
pub struct HttpTransport {
    base_url: String,
    user_agent: String,
    timeout: Option<Duration>,
    sessions: Mutex<HashMap<TokenDigest, Client>>,
}

impl HttpTransport {
    /// Create a transport for a GitHub API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the URL is not http(s).
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url",
                reason: format!("expected an http(s) URL, got '{}'", base_url),
            }
            .into());
        }

        Ok(Self {
            base_url,
            user_agent: constants::user_agent(),
            timeout: None,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request timeout. Without one, reqwest's default applies.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of cached per-token sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Client for `token`, built on first use.
    ///
    /// The lock is not held while building, so two first-time callers may
    /// both build a client; the later insert wins.
    fn session(&self, token: &str) -> Result<Client> {
        let digest: TokenDigest = Sha256::digest(token.as_bytes()).into();

        if let Some(client) = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&digest)
        {
            trace!("reusing github session");
            return Ok(client.clone());
        }

        debug!("creating github session");
        let client = self.build_client(token)?;
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(digest, client.clone());
        Ok(client)
    }

    fn build_client(&self, token: &str) -> Result<Client> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ValidationError::InvalidAuthorization)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let mut builder = Client::builder()
            .user_agent(self.user_agent.clone())
            .default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(|e| UpstreamError::Network(e).into())
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest<'_>) -> Result<ApiResponse> {
        let client = self.session(request.token)?;
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = client.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(UpstreamError::Network)?;
        let status = response.status().as_u16();
        let rate_limit_remaining = header_u64(response.headers(), "x-ratelimit-remaining");
        let retry_after = header_u64(response.headers(), "retry-after");
        let body = response.text().map_err(UpstreamError::Network)?;

        trace!(status, body_len = body.len(), "http response");

        Ok(ApiResponse {
            status,
            rate_limit_remaining,
            retry_after,
            body,
        })
    }
}
