//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A Curve25519 key as 64 lowercase hex characters.
pub type HexKey = String;

/// Base64 sealed-box ciphertext.
pub type EncryptedPayload = String;

/// A GitHub Actions secret name (e.g., DEPLOY_KEY).
pub type SecretName = String;

/// GitHub-issued identifier of a scope's current public key.
pub type KeyId = String;

/// Numeric GitHub repository id, used for organization secret visibility.
pub type RepositoryId = u64;
