//! Structured-input facade.
//!
//! Everything a routing layer (or the CLI) needs, taking plain inputs such
//! as `encrypted_pat`, scope fields, `encrypted_value`, and
//! `encryption_type`. Payload and PAT operations report failures as data;
//! secrets operations return `Err` for the caller to classify.

use std::sync::Arc;

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::cipher::{self, KeyPair};
use crate::core::codec::{DecryptResult, EncryptResult, EncryptionKind, PayloadCodec, ValidateResult};
use crate::core::config::Config;
use crate::core::github::{GithubClient, HttpTransport, Transport};
use crate::core::guard::{CredentialGuard, PatSealResult, PatTestResult};
use crate::core::relay::{KeyCache, Scope, SecretMetadata, SecretsRelay, WriteOptions, WriteOutcome};
use crate::error::{CipherError, Result};

/// Request to store a secret whose value arrives sealed for the service.
#[derive(Debug, Clone)]
pub struct SetSecretRequest<'a> {
    pub encrypted_pat: &'a str,
    pub scope: &'a Scope,
    pub name: &'a str,
    /// Value sealed with the service's public key.
    pub encrypted_value: &'a str,
    pub encryption_type: EncryptionKind,
    pub options: WriteOptions,
}

/// Service facade owning the key pair and every component.
pub struct Gateway<T: Transport = HttpTransport> {
    keys: KeyPair,
    codec: PayloadCodec,
    guard: CredentialGuard<T>,
    relay: SecretsRelay<T>,
}

impl Gateway<HttpTransport> {
    /// Build a gateway from configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingKeys` without key material, `CipherError` for
    /// unusable keys, `ConfigError::InvalidValue` for a bad API URL.
    pub fn from_config(config: &Config) -> Result<Self> {
        let keys = config.service_keys()?;
        let transport = HttpTransport::new(&config.github.api_url)?
            .with_user_agent(config.user_agent())
            .with_timeout(config.timeout());
        Self::new(
            keys,
            GithubClient::new(transport),
            KeyCache::with_ttl(config.key_cache_ttl()),
        )
    }
}

impl<T: Transport> Gateway<T> {
    /// # Errors
    ///
    /// Returns `CipherError::KeyMismatch` if the key pair fails its probe.
    pub fn new(keys: KeyPair, github: GithubClient<T>, cache: KeyCache) -> Result<Self> {
        if !cipher::validate_keypair(&keys) {
            return Err(CipherError::KeyMismatch.into());
        }
        let guard = CredentialGuard::new(&keys, github.clone())?;
        let relay = SecretsRelay::with_cache(github, cache);
        debug!(fingerprint = %keys.fingerprint(), "gateway ready");

        Ok(Self {
            keys,
            codec: PayloadCodec::new(),
            guard,
            relay,
        })
    }

    /// Build over a shared transport.
    pub fn with_transport(keys: KeyPair, transport: Arc<T>, cache: KeyCache) -> Result<Self> {
        Self::new(keys, GithubClient::from_shared(transport), cache)
    }

    /// Service public key (hex) that clients seal with.
    pub fn public_key(&self) -> &str {
        self.keys.public_key()
    }

    pub fn fingerprint(&self) -> String {
        self.keys.fingerprint()
    }

    pub fn guard(&self) -> &CredentialGuard<T> {
        &self.guard
    }

    pub fn relay(&self) -> &SecretsRelay<T> {
        &self.relay
    }

    /// Encrypt for the service key.
    pub fn encrypt(&self, value: &str, kind: EncryptionKind) -> EncryptResult {
        self.codec.encrypt(value, kind, self.keys.public_key())
    }

    /// Decrypt with the service key.
    pub fn decrypt(&self, encrypted: &str, kind: EncryptionKind) -> DecryptResult {
        self.codec.decrypt(encrypted, kind, self.keys.private_key())
    }

    /// Probe decryptability with the service key.
    pub fn validate(&self, encrypted: &str, kind: EncryptionKind) -> ValidateResult {
        self.codec.validate(encrypted, kind, self.keys.private_key())
    }

    pub fn test_pat(&self, encrypted_pat: &str) -> PatTestResult {
        self.guard.test(encrypted_pat)
    }

    pub fn seal_pat(&self, pat: &str) -> PatSealResult {
        self.guard.seal_verified(pat)
    }

    pub fn list_secrets(&self, encrypted_pat: &str, scope: &Scope) -> Result<Vec<SecretMetadata>> {
        let token = self.guard.decrypt_pat(encrypted_pat)?;
        self.relay.list(&token, scope)
    }

    pub fn get_secret(&self, encrypted_pat: &str, scope: &Scope, name: &str) -> Result<Option<SecretMetadata>> {
        let token = self.guard.decrypt_pat(encrypted_pat)?;
        self.relay.get(&token, scope, name)
    }

    /// Open a value sealed for the service and re-seal it for the scope.
    ///
    /// The stored secret is the value's rendered form: text as-is, JSON
    /// compacted, data as base64.
    ///
    /// # Errors
    ///
    /// `CipherError::DecryptionFailed` if the value does not open as
    /// `encryption_type`, plus any relay error.
    pub fn set_secret(&self, request: &SetSecretRequest<'_>) -> Result<WriteOutcome> {
        let token = self.guard.decrypt_pat(request.encrypted_pat)?;

        let opened = self.decrypt(request.encrypted_value, request.encryption_type);
        let value = match opened.decrypted {
            Some(value) if opened.success => Zeroizing::new(value),
            _ => {
                return Err(CipherError::DecryptionFailed(
                    opened.error.unwrap_or_else(|| "value did not decrypt".to_string()),
                )
                .into())
            }
        };

        self.relay.write(
            &token,
            request.scope,
            request.name,
            value.as_bytes(),
            &request.options,
        )
    }

    pub fn delete_secret(&self, encrypted_pat: &str, scope: &Scope, name: &str) -> Result<bool> {
        let token = self.guard.decrypt_pat(encrypted_pat)?;
        self.relay.delete(&token, scope, name)
    }
}
