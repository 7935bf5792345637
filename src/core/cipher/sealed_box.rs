//! Sealed-box encryption backend.
//!
//! Provides anonymous-sender encryption using an ephemeral X25519 key per
//! message, matching libsodium's `crypto_box_seal` wire format.

use crypto_box::aead::OsRng;
use crypto_box::{PublicKey, SecretKey};
use tracing::trace;

use super::Cipher;
use crate::core::constants::SEAL_OVERHEAD;
use crate::error::{CipherError, Result};

/// Sealed-box backend using Curve25519 keys
pub struct SealedBox;

impl Cipher for SealedBox {
    type Recipient = PublicKey;
    type Identity = SecretKey;

    fn name(&self) -> &'static str {
        "sealed-box"
    }

    fn seal(&self, plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>> {
        trace!(plaintext_len = plaintext.len(), "sealing");

        let sealed = recipient
            .seal(&mut OsRng, plaintext)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        trace!(ciphertext_len = sealed.len(), "sealed");
        Ok(sealed)
    }

    fn unseal(&self, ciphertext: &[u8], identity: &SecretKey) -> Result<Vec<u8>> {
        trace!(ciphertext_len = ciphertext.len(), "unsealing");

        if ciphertext.len() < SEAL_OVERHEAD {
            return Err(CipherError::TooShort {
                len: ciphertext.len(),
                min: SEAL_OVERHEAD,
            }
            .into());
        }

        let opened = identity.unseal(ciphertext).map_err(|_| {
            CipherError::DecryptionFailed("authentication failed: wrong key or tampered data".to_string())
        })?;

        trace!(plaintext_len = opened.len(), "unsealed");
        Ok(opened)
    }
}
