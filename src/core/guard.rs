//! Personal access token relay.
//!
//! A client submits its GitHub PAT once, sealed with the service's public
//! key. The guard opens it only for the duration of the call that needs it,
//! checks it against GitHub, and hands back an encrypted form the client can
//! keep instead of the plaintext.
//!
//! Per-request progression:
//!
//! ```text
//! NoToken -> Decrypting -> Decrypted -> GithubValidating -> Success
//!                                                        -> GithubRejected
//! ```
//!
//! Nothing persists across requests and a decrypted PAT is never logged.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::cipher::{self, KeyPair};
use crate::core::codec::decode_ciphertext;
use crate::core::github::{GithubClient, GithubUser, RateLimitStatus, Transport};
use crate::core::types::EncryptedPayload;
use crate::error::{CipherError, Error, ErrorKind, Result, UpstreamError, UpstreamReason, ValidationError};

/// Where a single guard request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    NoToken,
    Decrypting,
    Decrypted,
    GithubValidating,
    Success,
    GithubRejected,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoToken => "no_token",
            Self::Decrypting => "decrypting",
            Self::Decrypted => "decrypted",
            Self::GithubValidating => "github_validating",
            Self::Success => "success",
            Self::GithubRejected => "github_rejected",
        };
        f.write_str(s)
    }
}

fn enter(state: GuardState) {
    trace!(state = %state, "guard state");
}

/// Outcome of testing a PAT against GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatTestResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<GithubUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitStatus>,
    pub timestamp: DateTime<Utc>,
}

impl PatTestResult {
    fn failure(kind: ErrorKind, err: &Error) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            error_type: Some(kind),
            user: None,
            rate_limit: None,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of sealing a freshly verified PAT for client reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatSealResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_pat: Option<EncryptedPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<GithubUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

/// Classify an upstream failure for PAT testing.
///
/// 401 and a 403 without rate-limit indication mean the token is bad; a
/// rate-limited 403 (or 429) is RATE_LIMIT; anything else is GITHUB_ERROR.
pub fn classify_pat_error(err: &Error) -> ErrorKind {
    match err {
        Error::Upstream(UpstreamError::Status { reason, .. }) => match reason {
            UpstreamReason::Unauthorized | UpstreamReason::Forbidden => ErrorKind::InvalidPat,
            UpstreamReason::RateLimited => ErrorKind::RateLimit,
            UpstreamReason::NotFound
            | UpstreamReason::Unprocessable
            | UpstreamReason::Server
            | UpstreamReason::Other => ErrorKind::GithubError,
        },
        Error::Upstream(_) => ErrorKind::GithubError,
        other => other.kind(),
    }
}

/// Extract the PAT from an `Authorization` header value.
///
/// Accepts `token <PAT>` and `Bearer <PAT>`, scheme case-insensitive.
///
/// # Errors
///
/// `ValidationError::MissingHeader` when absent or blank,
/// `ValidationError::InvalidAuthorization` for any other shape.
pub fn parse_authorization(header: Option<&str>) -> Result<&str> {
    let header = match header.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => return Err(ValidationError::MissingHeader.into()),
    };

    let (scheme, credential) = header
        .split_once(char::is_whitespace)
        .ok_or(ValidationError::InvalidAuthorization)?;
    let credential = credential.trim();

    if credential.is_empty() || credential.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidAuthorization.into());
    }

    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Ok(credential)
    } else {
        Err(ValidationError::InvalidAuthorization.into())
    }
}

/// PAT relay bound to the service's own key pair.
pub struct CredentialGuard<T: Transport> {
    recipient: PublicKey,
    identity: SecretKey,
    github: GithubClient<T>,
}

impl<T: Transport> CredentialGuard<T> {
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` if the key pair cannot be parsed.
    pub fn new(keys: &KeyPair, github: GithubClient<T>) -> Result<Self> {
        Ok(Self {
            recipient: keys.recipient()?,
            identity: keys.identity()?,
            github,
        })
    }

    /// Open an encrypted PAT.
    ///
    /// # Errors
    ///
    /// Each failure is distinct: missing input (`ValidationError`), invalid
    /// base64, crypto failure, or a non-UTF-8 payload (`CipherError`).
    pub fn decrypt_pat(&self, encrypted_pat: &str) -> Result<Zeroizing<String>> {
        if encrypted_pat.trim().is_empty() {
            enter(GuardState::NoToken);
            return Err(ValidationError::EmptyField { field: "encrypted_pat" }.into());
        }

        enter(GuardState::Decrypting);
        let ciphertext = decode_ciphertext(encrypted_pat)?;
        let opened = Zeroizing::new(cipher::unseal(&ciphertext, &self.identity)?);
        let pat = std::str::from_utf8(&opened)
            .map_err(|e| CipherError::InvalidUtf8(e.to_string()))?;

        enter(GuardState::Decrypted);
        Ok(Zeroizing::new(pat.to_string()))
    }

    /// Seal a PAT with the service's public key, base64-encoded.
    pub fn encrypt_pat(&self, pat: &str) -> Result<String> {
        if pat.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "pat" }.into());
        }
        let sealed = cipher::seal(pat.as_bytes(), &self.recipient)?;
        Ok(BASE64.encode(sealed))
    }

    /// Check a plaintext PAT against `/user` and `/rate_limit`.
    pub fn test_github_pat(&self, pat: &str) -> PatTestResult {
        enter(GuardState::GithubValidating);

        let checked = self
            .github
            .user(pat)
            .and_then(|user| Ok((user, self.github.rate_limit(pat)?)));

        match checked {
            Ok((user, rate_limit)) => {
                enter(GuardState::Success);
                debug!(login = %user.login, remaining = rate_limit.remaining, "token accepted by github");
                PatTestResult {
                    success: true,
                    error: None,
                    error_type: None,
                    user: Some(user),
                    rate_limit: Some(rate_limit),
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                enter(GuardState::GithubRejected);
                let kind = classify_pat_error(&e);
                debug!(error_type = %kind, "token rejected by github");
                PatTestResult::failure(kind, &e)
            }
        }
    }

    /// Open an encrypted PAT and test it against GitHub.
    pub fn test(&self, encrypted_pat: &str) -> PatTestResult {
        match self.decrypt_pat(encrypted_pat) {
            Ok(pat) => self.test_github_pat(&pat),
            Err(e) => PatTestResult::failure(pat_decrypt_kind(&e), &e),
        }
    }

    /// Test a plaintext PAT and, only if GitHub accepts it, seal it for the
    /// client to keep.
    pub fn seal_verified(&self, pat: &str) -> PatSealResult {
        let tested = self.test_github_pat(pat);
        if !tested.success {
            return PatSealResult {
                success: false,
                encrypted_pat: None,
                user: None,
                error: tested.error,
                error_type: tested.error_type,
                timestamp: tested.timestamp,
            };
        }

        match self.encrypt_pat(pat) {
            Ok(encrypted) => PatSealResult {
                success: true,
                encrypted_pat: Some(encrypted),
                user: tested.user,
                error: None,
                error_type: None,
                timestamp: Utc::now(),
            },
            Err(e) => PatSealResult {
                success: false,
                encrypted_pat: None,
                user: None,
                error: Some(e.to_string()),
                error_type: Some(ErrorKind::EncryptionFailed),
                timestamp: Utc::now(),
            },
        }
    }
}

/// Missing input stays MISSING_HEADER; every other open failure is
/// DECRYPTION_FAILED.
fn pat_decrypt_kind(err: &Error) -> ErrorKind {
    match err {
        Error::Validation(_) => ErrorKind::MissingHeader,
        _ => ErrorKind::DecryptionFailed,
    }
}
