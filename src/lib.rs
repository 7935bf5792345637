//! ghseal - A sealed-box relay for GitHub tokens and Actions secrets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── keys          # Service key generation
//! │   ├── payload       # encrypt / decrypt / validate
//! │   ├── pat           # PAT sealing and testing
//! │   ├── secrets       # Actions secrets CRUD
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher/       # Sealed-box primitives and key pairs
//!     ├── codec         # Text / JSON / data payload encryption
//!     ├── guard         # PAT relay
//!     ├── github/       # GitHub REST transport and client
//!     ├── relay/        # Per-scope key cache and secrets CRUD
//!     ├── gateway       # Structured-input facade
//!     └── config        # ~/.ghseal/config.toml management
//! ```
//!
//! # Features
//!
//! - Curve25519 sealed boxes, compatible with GitHub's secret encryption
//! - Clients keep only an encrypted PAT after submitting it once
//! - Repository, environment, and organization secrets, each encrypted
//!   with its own scope key
//! - Secret values are never stored or logged

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::codec::{EncryptionKind, PayloadCodec};
pub use crate::core::gateway::{Gateway, SetSecretRequest};
pub use crate::core::relay::Scope;
pub use crate::error::{Error, ErrorKind, Result};
