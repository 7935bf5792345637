//! GitHub Actions secrets relay.
//!
//! Scope-correct CRUD against GitHub's Secrets API. Every write re-encrypts
//! the value with the target scope's own public key, fetched lazily and
//! cached per scope.
//!
//! Transport failures propagate as `Err` for the caller to classify by
//! [`ErrorKind`](crate::error::ErrorKind); "not found" is normalized to
//! `None`/`false` instead.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::core::cipher;
use crate::core::constants::PAGE_SIZE;
use crate::core::github::{GithubClient, Transport};
use crate::core::types::{KeyId, RepositoryId};
use crate::core::validation::validate_secret_name;
use crate::error::{Error, Result, UpstreamError, UpstreamReason, ValidationError};

mod cache;
mod scope;
mod types;

pub use cache::KeyCache;
pub use scope::Scope;
pub use types::{
    ScopePublicKey, SecretMetadata, SelectedRepository, Visibility, WriteOptions, WriteOutcome,
};

use types::{SecretPage, SelectedRepositoryPage};

/// A value sealed for one scope, ready to PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    pub key_id: KeyId,
    /// Base64 sealed box.
    pub encrypted_value: String,
}

/// Per-scope key caching and CRUD proxying.
pub struct SecretsRelay<T: Transport> {
    github: GithubClient<T>,
    keys: KeyCache,
}

impl<T: Transport> SecretsRelay<T> {
    pub fn new(github: GithubClient<T>) -> Self {
        Self::with_cache(github, KeyCache::new())
    }

    pub fn with_cache(github: GithubClient<T>, keys: KeyCache) -> Self {
        Self { github, keys }
    }

    /// The scope key cache, e.g. to invalidate after a known rotation.
    pub fn cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Public key for `scope`, from cache or GitHub.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError` if the key cannot be fetched.
    pub fn get_scope_key(&self, token: &str, scope: &Scope) -> Result<ScopePublicKey> {
        if let Some(key) = self.keys.get(scope) {
            return Ok(key);
        }
        self.fetch_scope_key(token, scope)
    }

    /// Drop any cached key for `scope` and fetch the current one.
    pub fn refresh_scope_key(&self, token: &str, scope: &Scope) -> Result<ScopePublicKey> {
        self.keys.invalidate(scope);
        self.fetch_scope_key(token, scope)
    }

    fn fetch_scope_key(&self, token: &str, scope: &Scope) -> Result<ScopePublicKey> {
        scope.validate()?;
        debug!(scope = %scope, "fetching scope key");
        let key: ScopePublicKey = self.github.get(token, &scope.public_key_path())?;
        self.keys.insert(scope.clone(), key.clone());
        Ok(key)
    }

    /// Seal `plaintext` with the scope's key.
    pub fn seal_for_scope(&self, token: &str, scope: &Scope, plaintext: &[u8]) -> Result<SealedValue> {
        let key = self.get_scope_key(token, scope)?;
        seal_with(&key, plaintext)
    }

    /// Seal `plaintext` with the scope's key, returning base64 ciphertext.
    pub fn encrypt_for_scope(&self, token: &str, scope: &Scope, plaintext: &[u8]) -> Result<String> {
        Ok(self.seal_for_scope(token, scope, plaintext)?.encrypted_value)
    }

    /// All secrets in `scope`, following pagination.
    pub fn list(&self, token: &str, scope: &Scope) -> Result<Vec<SecretMetadata>> {
        scope.validate()?;
        let mut secrets = Vec::new();
        let mut page = 1;

        loop {
            let path = format!("{}?per_page={}&page={}", scope.secrets_path(), PAGE_SIZE, page);
            let batch: SecretPage = self.github.get(token, &path)?;
            let fetched = batch.secrets.len();
            secrets.extend(batch.secrets);

            if fetched == 0 || secrets.len() >= batch.total_count {
                break;
            }
            page += 1;
        }

        debug!(scope = %scope, count = secrets.len(), "listed secrets");
        Ok(secrets)
    }

    /// Metadata for one secret; `None` if GitHub answers 404.
    pub fn get(&self, token: &str, scope: &Scope, name: &str) -> Result<Option<SecretMetadata>> {
        scope.validate()?;
        validate_secret_name(name)?;

        match self.github.get(token, &scope.secret_path(name)) {
            Ok(meta) => Ok(Some(meta)),
            Err(Error::Upstream(e)) if e.is_not_found() => {
                debug!(scope = %scope, name, "secret absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Encrypt `value` for the scope and PUT it, reporting create vs update.
    ///
    /// If GitHub rejects the write as unprocessable, the scope key is
    /// refreshed. The write is retried once, and only when the key rotated.
    pub fn write(
        &self,
        token: &str,
        scope: &Scope,
        name: &str,
        value: &[u8],
        options: &WriteOptions,
    ) -> Result<WriteOutcome> {
        scope.validate()?;
        validate_secret_name(name)?;
        options.validate()?;

        let sealed = self.seal_for_scope(token, scope, value)?;
        let status = match self.put_sealed(token, scope, name, &sealed, options) {
            Err(err @ Error::Upstream(UpstreamError::Status {
                reason: UpstreamReason::Unprocessable,
                ..
            })) => {
                warn!(scope = %scope, key_id = %sealed.key_id, "write rejected, refreshing scope key");
                let key = self.refresh_scope_key(token, scope)?;
                if key.key_id == sealed.key_id {
                    // Same key: the rejection is about the request itself.
                    return Err(err);
                }
                let resealed = seal_with(&key, value)?;
                self.put_sealed(token, scope, name, &resealed, options)?
            }
            other => other?,
        };

        let outcome = WriteOutcome::from_status(status);
        if !matches!(status, 201 | 204) {
            warn!(status, "unexpected success status for secret write");
        }
        info!(scope = %scope, name, outcome = ?outcome, "secret written");
        Ok(outcome)
    }

    /// Encrypt and PUT; `true` whether GitHub created or updated.
    pub fn create_or_update(
        &self,
        token: &str,
        scope: &Scope,
        name: &str,
        value: &[u8],
        options: &WriteOptions,
    ) -> Result<bool> {
        self.write(token, scope, name, value, options).map(|_| true)
    }

    fn put_sealed(
        &self,
        token: &str,
        scope: &Scope,
        name: &str,
        sealed: &SealedValue,
        options: &WriteOptions,
    ) -> Result<u16> {
        let body = write_body(scope, sealed, options);
        self.github.put(token, &scope.secret_path(name), body)
    }

    /// DELETE a secret; `false` if GitHub answers 404.
    pub fn delete(&self, token: &str, scope: &Scope, name: &str) -> Result<bool> {
        scope.validate()?;
        validate_secret_name(name)?;

        match self.github.delete(token, &scope.secret_path(name)) {
            Ok(_) => {
                info!(scope = %scope, name, "secret deleted");
                Ok(true)
            }
            Err(Error::Upstream(e)) if e.is_not_found() => {
                debug!(scope = %scope, name, "secret already absent");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Repositories an organization secret with `selected` visibility is
    /// shared with.
    pub fn list_selected_repositories(
        &self,
        token: &str,
        org: &str,
        name: &str,
    ) -> Result<Vec<SelectedRepository>> {
        let scope = Scope::organization(org);
        scope.validate()?;
        validate_secret_name(name)?;

        let path = format!("{}/repositories", scope.secret_path(name));
        let page: SelectedRepositoryPage = self.github.get(token, &path)?;
        Ok(page.repositories)
    }

    /// Replace the repositories an organization secret is shared with.
    pub fn set_selected_repositories(
        &self,
        token: &str,
        org: &str,
        name: &str,
        ids: &[RepositoryId],
    ) -> Result<()> {
        let scope = Scope::organization(org);
        scope.validate()?;
        validate_secret_name(name)?;
        if ids.is_empty() {
            return Err(ValidationError::MissingSelectedRepositories.into());
        }

        let path = format!("{}/repositories", scope.secret_path(name));
        self.github
            .put(token, &path, json!({ "selected_repository_ids": ids }))?;
        Ok(())
    }
}

fn seal_with(key: &ScopePublicKey, plaintext: &[u8]) -> Result<SealedValue> {
    let recipient = cipher::public_key_from_base64(&key.key)?;
    let sealed = cipher::seal(plaintext, &recipient)?;
    Ok(SealedValue {
        key_id: key.key_id.clone(),
        encrypted_value: BASE64.encode(sealed),
    })
}

fn write_body(scope: &Scope, sealed: &SealedValue, options: &WriteOptions) -> Value {
    let mut body = Map::new();
    body.insert("encrypted_value".into(), Value::from(sealed.encrypted_value.clone()));
    body.insert("key_id".into(), Value::from(sealed.key_id.clone()));

    if scope.is_organization() {
        let visibility = options.visibility.unwrap_or(Visibility::Private);
        body.insert("visibility".into(), Value::from(visibility.as_str()));
        if visibility == Visibility::Selected {
            body.insert(
                "selected_repository_ids".into(),
                Value::from(options.selected_repository_ids.clone()),
            );
        }
    }

    Value::Object(body)
}
