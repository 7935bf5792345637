//! Constants used throughout ghseal.
//!
//! Centralizes magic strings and configuration values.

/// Identifier reported with every encryption result.
pub const ALGORITHM: &str = "x25519-xsalsa20poly1305-sealedbox";

/// Sealed-box overhead: ephemeral public key (32) + Poly1305 tag (16).
pub const SEAL_OVERHEAD: usize = 48;

/// Curve25519 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Probe message used by key pair self-tests.
pub const PROBE_MESSAGE: &[u8] = b"ghseal key pair probe";

/// Default GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub REST API version header value.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Media type requested from the GitHub REST API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Page size used when listing secrets.
pub const PAGE_SIZE: usize = 100;

/// Config directory relative to HOME (~/.ghseal).
pub const CONFIG_DIR: &str = ".ghseal";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable names.
pub mod env {
    pub const CONFIG: &str = "GHSEAL_CONFIG";
    pub const LOG: &str = "GHSEAL_LOG";
    pub const PUBLIC_KEY: &str = "GHSEAL_PUBLIC_KEY";
    pub const PRIVATE_KEY: &str = "GHSEAL_PRIVATE_KEY";
    pub const GITHUB_API_URL: &str = "GHSEAL_GITHUB_API_URL";
    pub const ENCRYPTED_PAT: &str = "GHSEAL_ENCRYPTED_PAT";
}

/// Default User-Agent sent to GitHub.
pub fn user_agent() -> String {
    format!("ghseal/{}", env!("CARGO_PKG_VERSION"))
}
