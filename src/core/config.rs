//! Configuration file management.
//!
//! Handles reading, writing, and validating `~/.ghseal/config.toml`, with
//! environment variable overrides for key material and the API URL.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cipher::{self, KeyPair};
use crate::core::constants::{self, env};
use crate::error::{CipherError, ConfigError, Result};

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream GitHub API settings
    pub github: GithubConfig,
    /// The service's own key pair
    pub keys: KeysConfig,
    /// Secrets relay settings
    pub relay: RelayConfig,
}

/// `[github]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base URL (GitHub Enterprise Server: `https://HOST/api/v3`)
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Per-request timeout. Unset means the HTTP client's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: constants::GITHUB_API_URL.to_string(),
            user_agent: None,
            timeout_secs: None,
        }
    }
}

/// `[keys]` section, hex-encoded Curve25519 keys
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl fmt::Debug for KeysConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// `[relay]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Scope key lifetime. Unset means keys are kept for the process lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Default config path (`~/.ghseal/config.toml`)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(constants::CONFIG_DIR).join(constants::CONFIG_FILE))
    }

    /// Resolve the config path: explicit flag, then `GHSEAL_CONFIG`, then default.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(env::CONFIG) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Self::default_path()
    }

    /// Load configuration, apply environment overrides, and validate.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// file that was named explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse` on unreadable
    /// or malformed TOML, and validation errors from [`Config::validate`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit.is_some() || std::env::var_os(env::CONFIG).is_some();
        let path = Self::resolve_path(explicit)?;
        debug!(path = %path.display(), "loading config");

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if named {
            return Err(ConfigError::ReadFile(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
            .into());
        } else {
            debug!("no config file, using defaults");
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents).map_err(ConfigError::Parse)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(env::PUBLIC_KEY) {
            debug!(var = env::PUBLIC_KEY, "public key from environment");
            self.keys.public_key = Some(key);
        }
        if let Some(key) = lookup(env::PRIVATE_KEY) {
            debug!(var = env::PRIVATE_KEY, "private key from environment");
            self.keys.private_key = Some(key);
        }
        if let Some(url) = lookup(env::GITHUB_API_URL) {
            self.github.api_url = url;
        }
    }

    /// Validate structure and contents.
    ///
    /// Checks:
    /// - API URL is http(s)
    /// - Any configured key is 32 bytes of hex
    /// - A public key is never configured without its private key
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on validation failure.
    pub fn validate(&self) -> Result<()> {
        let url = self.github.api_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url",
                reason: format!("expected an http(s) URL, got '{}'", url),
            }
            .into());
        }
        if url.starts_with("http://") {
            warn!(url, "github api url is not https");
        }

        if let Some(public) = &self.keys.public_key {
            cipher::load_public(public).map_err(|e| ConfigError::InvalidValue {
                field: "keys.public_key",
                reason: e.to_string(),
            })?;
            if self.keys.private_key.is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "keys.private_key",
                    reason: "public key configured without private key".to_string(),
                }
                .into());
            }
        }

        if let Some(private) = &self.keys.private_key {
            cipher::load_private(private).map_err(|e| ConfigError::InvalidValue {
                field: "keys.private_key",
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// The service key pair, checked with a round-trip probe.
    ///
    /// A lone private key is enough; the public half is derived.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKeys` when no key material is configured
    /// and `CipherError::KeyMismatch` when the halves do not belong together.
    pub fn service_keys(&self) -> Result<KeyPair> {
        let pair = match (&self.keys.public_key, &self.keys.private_key) {
            (_, None) => return Err(ConfigError::MissingKeys.into()),
            (Some(public), Some(private)) => KeyPair::from_hex(public, private)?,
            (None, Some(private)) => KeyPair::from_private_hex(private)?,
        };

        if !cipher::validate_keypair(&pair) {
            return Err(CipherError::KeyMismatch.into());
        }

        debug!(fingerprint = %pair.fingerprint(), "service key pair loaded");
        Ok(pair)
    }

    /// Store a key pair in the `[keys]` section.
    pub fn set_keys(&mut self, pair: &KeyPair) {
        self.keys.public_key = Some(pair.public_key().to_string());
        self.keys.private_key = Some(pair.private_key().to_string());
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.github.timeout_secs.map(Duration::from_secs)
    }

    pub fn key_cache_ttl(&self) -> Option<Duration> {
        self.relay.key_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn user_agent(&self) -> String {
        self.github
            .user_agent
            .clone()
            .unwrap_or_else(constants::user_agent)
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// The file holds a private key, so it is written 0600 on Unix.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving config");

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
