//! Error types.
//!
//! One enum per concern, all folded into [`Error`]. Every error maps to a
//! single [`ErrorKind`], the closed taxonomy reported to callers as data.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-wide error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

/// Sealing, unsealing, and key material errors.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("ciphertext too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("public key is not derived from private key")]
    KeyMismatch,
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("service key pair is not configured")]
    MissingKeys,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unable to determine home directory")]
    NoHomeDir,
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("invalid Authorization header: expected 'token <PAT>' or 'Bearer <PAT>'")]
    InvalidAuthorization,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("invalid secret name '{name}': {reason}")]
    InvalidSecretName { name: String, reason: String },

    #[error("invalid {field} '{value}': {reason}")]
    InvalidScopeField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown encryption type '{0}': expected text, json, or data")]
    InvalidKind(String),

    #[error("unknown visibility '{0}': expected all, private, or selected")]
    InvalidVisibility(String),

    #[error("visibility 'selected' requires at least one repository id")]
    MissingSelectedRepositories,

    #[error("repository ids only apply to visibility 'selected', not '{0}'")]
    UnexpectedSelectedRepositories(String),
}

/// Why GitHub rejected a request, derived from the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamReason {
    Unauthorized,
    Forbidden,
    RateLimited,
    NotFound,
    Unprocessable,
    Server,
    Other,
}

impl UpstreamReason {
    /// Classify a status code. `rate_limited` reflects the response's
    /// quota headers or error body.
    pub fn from_status(status: u16, rate_limited: bool) -> Self {
        match (status, rate_limited) {
            (401, _) => Self::Unauthorized,
            (403, true) | (429, _) => Self::RateLimited,
            (403, false) => Self::Forbidden,
            (404, _) => Self::NotFound,
            (422, _) => Self::Unprocessable,
            (500..=599, _) => Self::Server,
            _ => Self::Other,
        }
    }
}

/// Errors talking to the GitHub REST API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Status {
        status: u16,
        reason: UpstreamReason,
        message: String,
    },

    #[error("invalid response from GitHub: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Build a status error, classifying the code.
    pub fn status(status: u16, rate_limited: bool, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: UpstreamReason::from_status(status, rate_limited),
            message: message.into(),
        }
    }

    /// Structured reason, if GitHub answered at all.
    pub fn reason(&self) -> Option<UpstreamReason> {
        match self {
            Self::Status { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.reason() == Some(UpstreamReason::NotFound)
    }
}

/// Closed error taxonomy reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingHeader,
    InvalidInput,
    DecryptionFailed,
    EncryptionFailed,
    InvalidPat,
    RateLimit,
    GithubError,
    NotFound,
    ServerError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MISSING_HEADER",
            Self::InvalidInput => "INVALID_INPUT",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
            Self::EncryptionFailed => "ENCRYPTION_FAILED",
            Self::InvalidPat => "INVALID_PAT",
            Self::RateLimit => "RATE_LIMIT",
            Self::GithubError => "GITHUB_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::ServerError => "SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cipher(e) => match e {
                CipherError::InvalidKey(_) | CipherError::InvalidJson(_) => ErrorKind::InvalidInput,
                CipherError::EncryptionFailed(_) => ErrorKind::EncryptionFailed,
                CipherError::InvalidBase64(_)
                | CipherError::TooShort { .. }
                | CipherError::DecryptionFailed(_)
                | CipherError::InvalidUtf8(_) => ErrorKind::DecryptionFailed,
                CipherError::KeyMismatch => ErrorKind::ServerError,
            },
            Error::Config(_) => ErrorKind::ServerError,
            Error::Validation(ValidationError::MissingHeader) => ErrorKind::MissingHeader,
            Error::Validation(_) => ErrorKind::InvalidInput,
            Error::Upstream(e) => match e.reason() {
                Some(UpstreamReason::Unauthorized) => ErrorKind::InvalidPat,
                Some(UpstreamReason::RateLimited) => ErrorKind::RateLimit,
                Some(UpstreamReason::NotFound) => ErrorKind::NotFound,
                Some(_) | None => ErrorKind::GithubError,
            },
            Error::Io(_) | Error::Json(_) | Error::Prompt(_) | Error::Other(_) => {
                ErrorKind::ServerError
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
