//! Payload encryption service.
//!
//! Generic encrypt/decrypt/validate over three content kinds. Failures at
//! this boundary are data: every operation returns a result object with
//! `success = false` and an error, never an `Err`.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::constants::{ALGORITHM, SEAL_OVERHEAD};
use crate::core::types::EncryptedPayload;
use crate::error::{CipherError, Error, ErrorKind, Result, ValidationError};

/// How a value is turned into bytes before sealing and back after unsealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionKind {
    /// UTF-8 text, sealed as-is.
    Text,
    /// JSON, validated and compacted before sealing.
    Json,
    /// Binary data, supplied and returned as base64.
    Data,
}

impl EncryptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Data => "data",
        }
    }

    /// Turn a caller-supplied value into the bytes to seal.
    fn encode(self, value: &str) -> Result<Zeroizing<Vec<u8>>> {
        let bytes = match self {
            Self::Text => value.as_bytes().to_vec(),
            Self::Json => canonical_json(value.as_bytes())?.into_bytes(),
            Self::Data => BASE64
                .decode(value.trim())
                .map_err(|e| CipherError::InvalidBase64(format!("data value: {}", e)))?,
        };
        Ok(Zeroizing::new(bytes))
    }

    /// Render unsealed bytes back into the caller-facing string form.
    fn render(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Text => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| CipherError::InvalidUtf8(e.to_string()).into()),
            Self::Json => canonical_json(bytes),
            Self::Data => Ok(BASE64.encode(bytes)),
        }
    }
}

impl fmt::Display for EncryptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "data" => Ok(Self::Data),
            other => Err(ValidationError::InvalidKind(other.to_string())),
        }
    }
}

/// Parse JSON and re-serialize it compactly, preserving key order and the
/// exact digits of every number.
fn canonical_json(bytes: &[u8]) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| CipherError::InvalidJson(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| CipherError::InvalidJson(e.to_string()).into())
}

/// Outcome of [`PayloadCodec::encrypt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<EncryptedPayload>,
    pub algorithm: String,
    pub encryption_type: EncryptionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

/// Outcome of [`PayloadCodec::decrypt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decrypted: Option<String>,
    pub encryption_type: EncryptionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

/// Outcome of [`PayloadCodec::validate`]. Never carries plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateResult {
    pub success: bool,
    pub can_decrypt: bool,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    pub encryption_type: EncryptionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

/// Encryption-side failures: only a failed seal is ENCRYPTION_FAILED, the
/// rest is bad caller input.
fn encrypt_kind(err: &Error) -> ErrorKind {
    match err.kind() {
        ErrorKind::EncryptionFailed => ErrorKind::EncryptionFailed,
        _ => ErrorKind::InvalidInput,
    }
}

/// Decryption-side failures: everything but an unusable key collapses to
/// DECRYPTION_FAILED.
fn decrypt_kind(err: &Error) -> ErrorKind {
    match err {
        Error::Cipher(CipherError::InvalidKey(_)) => ErrorKind::InvalidInput,
        _ => ErrorKind::DecryptionFailed,
    }
}

/// Decode base64 ciphertext and enforce the sealed-box minimum length.
pub fn decode_ciphertext(encrypted: &str) -> Result<Vec<u8>> {
    let bytes = BASE64
        .decode(encrypted.trim())
        .map_err(|e| CipherError::InvalidBase64(e.to_string()))?;
    if bytes.len() < SEAL_OVERHEAD {
        return Err(CipherError::TooShort {
            len: bytes.len(),
            min: SEAL_OVERHEAD,
        }
        .into());
    }
    Ok(bytes)
}

/// Generic encrypt/decrypt/validate service over sealed boxes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt `value` for a hex-encoded recipient public key.
    pub fn encrypt(&self, value: &str, kind: EncryptionKind, public_key: &str) -> EncryptResult {
        match cipher::load_public(public_key) {
            Ok(recipient) => self.encrypt_for(value, kind, &recipient),
            Err(e) => encrypt_failure(kind, &e),
        }
    }

    /// Encrypt `value` for an already-parsed recipient.
    pub fn encrypt_for(&self, value: &str, kind: EncryptionKind, recipient: &PublicKey) -> EncryptResult {
        debug!(kind = %kind, value_len = value.len(), "encrypting payload");

        let sealed = kind
            .encode(value)
            .and_then(|bytes| cipher::seal(&bytes, recipient));

        match sealed {
            Ok(ciphertext) => EncryptResult {
                success: true,
                encrypted: Some(BASE64.encode(ciphertext)),
                algorithm: ALGORITHM.to_string(),
                encryption_type: kind,
                timestamp: Utc::now(),
                error: None,
                error_type: None,
            },
            Err(e) => encrypt_failure(kind, &e),
        }
    }

    /// Decrypt a base64 payload with a hex-encoded private key.
    pub fn decrypt(&self, encrypted: &str, kind: EncryptionKind, private_key: &str) -> DecryptResult {
        match cipher::load_private(private_key) {
            Ok(identity) => self.decrypt_with(encrypted, kind, &identity),
            Err(e) => decrypt_failure(kind, &e),
        }
    }

    /// Decrypt a base64 payload with an already-parsed private key.
    pub fn decrypt_with(&self, encrypted: &str, kind: EncryptionKind, identity: &SecretKey) -> DecryptResult {
        debug!(kind = %kind, payload_len = encrypted.len(), "decrypting payload");

        match open(encrypted, identity).and_then(|bytes| kind.render(&bytes)) {
            Ok(decrypted) => DecryptResult {
                success: true,
                decrypted: Some(decrypted),
                encryption_type: kind,
                timestamp: Utc::now(),
                error: None,
                error_type: None,
            },
            Err(e) => decrypt_failure(kind, &e),
        }
    }

    /// Check that a payload decrypts and renders as `kind`, reporting only
    /// the plaintext's byte length.
    pub fn validate(&self, encrypted: &str, kind: EncryptionKind, private_key: &str) -> ValidateResult {
        let started = Instant::now();

        let outcome = cipher::load_private(private_key).and_then(|identity| {
            let bytes = open(encrypted, &identity)?;
            // Type-check, then drop the rendered form.
            let rendered = Zeroizing::new(kind.render(&bytes)?);
            trace!(rendered_len = rendered.len(), "payload renders");
            Ok(bytes.len())
        });

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(size) => ValidateResult {
                success: true,
                can_decrypt: true,
                duration_ms,
                size_bytes: Some(size),
                encryption_type: kind,
                timestamp: Utc::now(),
                error: None,
                error_type: None,
            },
            Err(e) => {
                debug!(kind = %kind, error = %e, "payload failed validation");
                ValidateResult {
                    success: false,
                    can_decrypt: false,
                    duration_ms,
                    size_bytes: None,
                    encryption_type: kind,
                    timestamp: Utc::now(),
                    error: Some(e.to_string()),
                    error_type: Some(decrypt_kind(&e)),
                }
            }
        }
    }
}

/// Base64-decode, length-check, and unseal.
fn open(encrypted: &str, identity: &SecretKey) -> Result<Zeroizing<Vec<u8>>> {
    let ciphertext = decode_ciphertext(encrypted)?;
    Ok(Zeroizing::new(cipher::unseal(&ciphertext, identity)?))
}

fn encrypt_failure(kind: EncryptionKind, err: &Error) -> EncryptResult {
    debug!(kind = %kind, error = %err, "payload encryption failed");
    EncryptResult {
        success: false,
        encrypted: None,
        algorithm: ALGORITHM.to_string(),
        encryption_type: kind,
        timestamp: Utc::now(),
        error: Some(err.to_string()),
        error_type: Some(encrypt_kind(err)),
    }
}

fn decrypt_failure(kind: EncryptionKind, err: &Error) -> DecryptResult {
    debug!(kind = %kind, error = %err, "payload decryption failed");
    DecryptResult {
        success: false,
        decrypted: None,
        encryption_type: kind,
        timestamp: Utc::now(),
        error: Some(err.to_string()),
        error_type: Some(decrypt_kind(err)),
    }
}
