//! Key pair type.
//!
//! Wraps a Curve25519 key pair in its hex form with secure memory handling
//! for the private half.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::aead::OsRng;
use crypto_box::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants::{KEY_LEN, PROBE_MESSAGE};
use crate::core::types::HexKey;
use crate::error::{CipherError, Result};

/// A Curve25519 key pair, each half a 64-character lowercase hex string.
#[derive(Clone)]
pub struct KeyPair {
    public_key: HexKey,
    private_key: Zeroizing<HexKey>,
}

impl KeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        let secret = SecretKey::generate(&mut OsRng);
        let pair = Self {
            public_key: hex::encode(secret.public_key().as_bytes()),
            private_key: Zeroizing::new(hex::encode(secret.to_bytes())),
        };
        debug!(fingerprint = %pair.fingerprint(), "generated key pair");
        pair
    }

    /// Build a key pair from hex strings.
    ///
    /// The public half must be the one derived from the private half.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` on malformed or wrong-length hex, and
    /// `CipherError::KeyMismatch` when the halves do not belong together.
    pub fn from_hex(public_key: &str, private_key: &str) -> Result<Self> {
        let recipient = load_public(public_key)?;
        let identity = load_private(private_key)?;
        if identity.public_key().as_bytes() != recipient.as_bytes() {
            return Err(CipherError::KeyMismatch.into());
        }

        Ok(Self {
            public_key: public_key.trim().to_ascii_lowercase(),
            private_key: Zeroizing::new(private_key.trim().to_ascii_lowercase()),
        })
    }

    /// Rebuild a key pair from its private half alone.
    pub fn from_private_hex(private_key: &str) -> Result<Self> {
        let secret = load_private(private_key)?;
        Ok(Self {
            public_key: hex::encode(secret.public_key().as_bytes()),
            private_key: Zeroizing::new(private_key.trim().to_ascii_lowercase()),
        })
    }

    /// Public key as hex
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Private key as hex
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Parsed public key for sealing
    pub fn recipient(&self) -> Result<PublicKey> {
        load_public(&self.public_key)
    }

    /// Parsed private key for unsealing
    pub fn identity(&self) -> Result<SecretKey> {
        load_private(&self.private_key)
    }

    /// Short fingerprint of the public key: first 8 bytes of its SHA-256.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.public_key.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

fn decode_hex_key(hex_key: &str, which: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| CipherError::InvalidKey(format!("{} key is not valid hex: {}", which, e)))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CipherError::InvalidKey(format!(
            "{} key must be {} bytes, got {}",
            which, KEY_LEN, len
        ))
        .into()
    })
}

/// Parse a hex public key.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` on malformed or wrong-length hex.
pub fn load_public(hex_key: &str) -> Result<PublicKey> {
    Ok(PublicKey::from(decode_hex_key(hex_key, "public")?))
}

/// Parse a hex private key.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` on malformed or wrong-length hex.
pub fn load_private(hex_key: &str) -> Result<SecretKey> {
    let bytes = Zeroizing::new(decode_hex_key(hex_key, "private")?);
    Ok(SecretKey::from(*bytes))
}

/// Parse a base64 public key, the form GitHub issues per scope.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` if the key is not base64 or not 32 bytes.
pub fn public_key_from_base64(key: &str) -> Result<PublicKey> {
    let bytes = BASE64
        .decode(key.trim())
        .map_err(|e| CipherError::InvalidKey(format!("public key is not valid base64: {}", e)))?;
    let len = bytes.len();
    let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
        CipherError::InvalidKey(format!("public key must be {} bytes, got {}", KEY_LEN, len))
    })?;
    Ok(PublicKey::from(bytes))
}

/// Seal the probe with the public half and open it with the private half.
pub(super) fn probe(pair: &KeyPair) -> Result<()> {
    let recipient = pair.recipient()?;
    let identity = pair.identity()?;

    if identity.public_key().as_bytes() != recipient.as_bytes() {
        return Err(CipherError::KeyMismatch.into());
    }

    let sealed = super::seal(PROBE_MESSAGE, &recipient)?;
    let opened = super::unseal(&sealed, &identity)?;
    if opened != PROBE_MESSAGE {
        return Err(CipherError::KeyMismatch.into());
    }
    Ok(())
}
