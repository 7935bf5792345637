//! Asymmetric cryptography.
//!
//! Key pair generation and loading plus raw seal/unseal primitives over
//! Curve25519 sealed boxes.
//!
//! ## Backends
//!
//! - **sealed box**: X25519 + XSalsa20-Poly1305, byte-compatible with
//!   libsodium's `crypto_box_seal`. This is the only format GitHub accepts
//!   for Actions secrets, so it is also what the service uses for its own
//!   key pair.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use crypto_box::{PublicKey, SecretKey};

use crate::error::Result;

mod keys;
mod sealed_box;

pub use keys::{load_private, load_public, public_key_from_base64, KeyPair};
pub use sealed_box::SealedBox;

/// Cryptographic backend trait.
///
/// Abstracts anonymous-sender public-key encryption: anyone holding the
/// recipient key may seal, only the identity holder may unseal.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Seal plaintext bytes for a recipient.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if sealing fails.
    fn seal(&self, plaintext: &[u8], recipient: &Self::Recipient) -> Result<Vec<u8>>;

    /// Unseal ciphertext with a private identity.
    ///
    /// Never returns partial plaintext: tampered data or a foreign key fail
    /// as a whole.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if authentication fails.
    fn unseal(&self, ciphertext: &[u8], identity: &Self::Identity) -> Result<Vec<u8>>;

    /// Backend name for display/logging.
    fn name(&self) -> &'static str;
}

/// Generate a fresh Curve25519 key pair, hex-encoded.
pub fn generate_keypair() -> KeyPair {
    KeyPair::generate()
}

/// Seal plaintext for a recipient with the sealed-box backend.
///
/// This is a convenience wrapper around `SealedBox::seal`.
pub fn seal(plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>> {
    SealedBox.seal(plaintext, recipient)
}

/// Unseal ciphertext with the sealed-box backend.
///
/// This is a convenience wrapper around `SealedBox::unseal`.
pub fn unseal(ciphertext: &[u8], identity: &SecretKey) -> Result<Vec<u8>> {
    SealedBox.unseal(ciphertext, identity)
}

/// Round-trip self-test of a key pair using a fixed probe message.
///
/// Returns `false` if either key fails to load or the probe does not
/// survive seal/unseal.
pub fn validate_keypair(pair: &KeyPair) -> bool {
    keys::probe(pair).is_ok()
}
