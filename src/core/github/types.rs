//! GitHub REST API response types.

use serde::{Deserialize, Serialize};

/// The authenticated user, from `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Core REST quota, from `GET /rate_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp at which the window resets.
    pub reset: u64,
    #[serde(default)]
    pub used: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResponse {
    pub rate: RateLimitStatus,
}

/// GitHub's error body shape.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

impl ErrorBody {
    /// Secondary rate limits answer 403 without quota headers; only the body
    /// says so.
    pub fn names_rate_limit(&self) -> bool {
        self.message.to_ascii_lowercase().contains("rate limit")
            || self
                .documentation_url
                .as_deref()
                .is_some_and(|url| url.contains("rate-limit"))
    }
}
