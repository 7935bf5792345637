//! Test support utilities for ghseal integration tests.
//!
//! [`Harness`] wires a [`Gateway`] to the in-memory GitHub double for
//! library-level tests; [`Test`] gives CLI tests an isolated home directory.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod github;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use github::MockGithub;

use std::path::PathBuf;
use std::sync::Arc;

use ghseal::core::cipher::KeyPair;
use ghseal::core::relay::{KeyCache, SecretsRelay};
use ghseal::{EncryptionKind, Gateway};
use tempfile::TempDir;

/// Gateway over the GitHub double, with a fresh service key pair.
pub struct Harness {
    pub github: Arc<MockGithub>,
    pub keys: KeyPair,
    pub gateway: Gateway<MockGithub>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cache(KeyCache::new())
    }

    pub fn with_cache(cache: KeyCache) -> Self {
        let github = Arc::new(MockGithub::new());
        let keys = KeyPair::generate();
        let gateway = Gateway::with_transport(keys.clone(), Arc::clone(&github), cache)
            .expect("failed to build gateway");
        Self {
            github,
            keys,
            gateway,
        }
    }

    pub fn relay(&self) -> &SecretsRelay<MockGithub> {
        self.gateway.relay()
    }

    /// [`TOKEN`] sealed for the service key.
    pub fn encrypted_pat(&self) -> String {
        self.seal_pat(TOKEN)
    }

    pub fn seal_pat(&self, pat: &str) -> String {
        self.gateway
            .guard()
            .encrypt_pat(pat)
            .expect("failed to seal pat")
    }

    /// Seal a value for the service key.
    pub fn seal(&self, value: &str, kind: EncryptionKind) -> String {
        let result = self.gateway.encrypt(value, kind);
        assert!(result.success, "encrypt failed: {:?}", result.error);
        result.encrypted.expect("missing ciphertext")
    }
}

/// CLI test environment with an isolated home directory.
///
/// No process-global state is mutated; child processes get HOME through
/// their environment so tests can run in parallel.
pub struct Test {
    pub home: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let home = TempDir::new().expect("failed to create temp home");
        Self { home }
    }

    /// Environment with a service key pair saved to the default config.
    pub fn with_keys() -> Self {
        let t = Self::new();
        let output = t.keygen();
        assert!(
            output.status.success(),
            "Failed to generate keys: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Default config path inside the temporary home.
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join(".ghseal").join("config.toml")
    }
}
