//! Command-line interface.

pub mod completions;
pub mod keys;
pub mod output;
pub mod pat;
pub mod payload;
pub mod secrets;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::core::codec::EncryptionKind;
use crate::core::config::Config;
use crate::core::constants::env;
use crate::core::gateway::Gateway;
use crate::core::relay::{Scope, Visibility};
use crate::core::types::RepositoryId;
use crate::error::Result;

/// ghseal - Sealed-box relay for GitHub tokens and Actions secrets.
#[derive(Parser)]
#[command(
    name = "ghseal",
    about = "Sealed-box relay for GitHub tokens and Actions secrets",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Config file (default: ~/.ghseal/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate a service key pair
    Keygen {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Store the key pair in the config file
        #[arg(long)]
        save: bool,
        /// Replace keys already in the config file
        #[arg(short, long, requires = "save")]
        force: bool,
    },

    /// Encrypt a value for the service key
    Encrypt {
        /// Plaintext value (base64 for --kind data)
        value: String,
        /// Payload kind: text, json, or data
        #[arg(short, long, default_value = "text")]
        kind: EncryptionKind,
        /// Encrypt for this public key (hex) instead of the configured one
        #[arg(long, value_name = "HEX")]
        public_key: Option<String>,
    },

    /// Decrypt a payload sealed for the service key
    Decrypt {
        /// Base64 sealed box
        payload: String,
        #[arg(short, long, default_value = "text")]
        kind: EncryptionKind,
        /// Decrypt with this private key (hex) instead of the configured one
        #[arg(long, value_name = "HEX", env = env::PRIVATE_KEY, hide_env_values = true)]
        private_key: Option<String>,
    },

    /// Check whether a payload decrypts, without revealing it
    Validate {
        /// Base64 sealed box
        payload: String,
        #[arg(short, long, default_value = "text")]
        kind: EncryptionKind,
        #[arg(long, value_name = "HEX", env = env::PRIVATE_KEY, hide_env_values = true)]
        private_key: Option<String>,
    },

    /// Seal and test GitHub personal access tokens
    Pat {
        #[command(subcommand)]
        action: PatAction,
    },

    /// Manage GitHub Actions secrets
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// PAT subcommands.
#[derive(Subcommand)]
pub enum PatAction {
    /// Verify a PAT with GitHub and print its encrypted form
    Seal {
        /// Token to seal (prompted for when omitted)
        pat: Option<String>,
        /// Seal without asking GitHub first
        #[arg(long)]
        no_verify: bool,
    },

    /// Decrypt an encrypted PAT and test it against GitHub
    Test {
        #[arg(env = env::ENCRYPTED_PAT, hide_env_values = true)]
        encrypted_pat: String,
    },
}

/// Secrets subcommands.
#[derive(Subcommand)]
pub enum SecretsAction {
    /// List secrets in a scope
    List {
        #[command(flatten)]
        target: TargetArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show metadata for one secret
    Get {
        #[command(flatten)]
        target: TargetArgs,
        /// Secret name
        name: String,
        #[arg(long)]
        json: bool,
    },

    /// Create or update a secret
    Set {
        #[command(flatten)]
        target: TargetArgs,
        /// Secret name
        name: String,
        /// Plaintext value (prompted for when omitted)
        #[arg(conflicts_with = "encrypted")]
        value: Option<String>,
        /// Value already sealed for the service key
        #[arg(long, value_name = "PAYLOAD")]
        encrypted: Option<String>,
        /// Kind of the value
        #[arg(short, long, default_value = "text")]
        kind: EncryptionKind,
        /// Organization secret visibility: all, private, or selected
        #[arg(long, requires = "org")]
        visibility: Option<Visibility>,
        /// Repository allowed to read a `selected` organization secret
        #[arg(long = "repo-id", value_name = "ID", requires = "org")]
        repo_ids: Vec<RepositoryId>,
    },

    /// Delete a secret
    Rm {
        #[command(flatten)]
        target: TargetArgs,
        /// Secret name
        name: String,
    },

    /// Show or replace the repositories an organization secret is shared with
    Repos {
        /// Organization
        #[arg(long)]
        org: String,
        /// Secret name
        name: String,
        /// Replace the list with these repository IDs
        #[arg(long = "set", value_name = "ID")]
        set: Vec<RepositoryId>,
        #[arg(long, env = env::ENCRYPTED_PAT, hide_env_values = true, value_name = "CIPHERTEXT")]
        encrypted_pat: String,
    },
}

/// Where a secrets command operates, and with which credential.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Repository as OWNER/REPO
    #[arg(
        long,
        value_name = "OWNER/REPO",
        required_unless_present = "org",
        conflicts_with = "org"
    )]
    pub repo: Option<String>,

    /// Deployment environment within --repo
    #[arg(long = "env", value_name = "NAME", requires = "repo")]
    pub environment: Option<String>,

    /// Organization
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    /// PAT sealed for the service key (see `ghseal pat seal`)
    #[arg(long, env = env::ENCRYPTED_PAT, hide_env_values = true, value_name = "CIPHERTEXT")]
    pub encrypted_pat: String,
}

impl TargetArgs {
    /// The scope these flags name.
    pub fn scope(&self) -> Result<Scope> {
        let scope = match (&self.org, &self.repo, &self.environment) {
            (Some(org), _, _) => Scope::organization(org.as_str()),
            (None, Some(full), None) => {
                let (owner, repo) = Scope::parse_repository(full)?;
                Scope::repository(owner, repo)
            }
            (None, Some(full), Some(environment)) => {
                let (owner, repo) = Scope::parse_repository(full)?;
                Scope::environment(owner, repo, environment.as_str())
            }
            (None, None, _) => {
                return Err(crate::error::ValidationError::EmptyField { field: "repo" }.into())
            }
        };
        scope.validate()?;
        Ok(scope)
    }
}

/// Load configuration for a command.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path)
}

/// Build a gateway from configuration.
pub(crate) fn gateway(path: Option<&Path>) -> Result<Gateway> {
    Gateway::from_config(&load_config(path)?)
}

/// Execute a command.
pub fn execute(command: Command, config: Option<&Path>) -> Result<()> {
    use Command::*;

    match command {
        Keygen { json, save, force } => keys::keygen(config, json, save, force),
        Encrypt {
            value,
            kind,
            public_key,
        } => payload::encrypt(config, &value, kind, public_key.as_deref()),
        Decrypt {
            payload: input,
            kind,
            private_key,
        } => payload::decrypt(config, &input, kind, private_key.as_deref()),
        Validate {
            payload: input,
            kind,
            private_key,
        } => payload::validate(config, &input, kind, private_key.as_deref()),
        Pat { action } => match action {
            PatAction::Seal { pat: token, no_verify } => pat::seal(config, token, no_verify),
            PatAction::Test { encrypted_pat } => pat::test(config, &encrypted_pat),
        },
        Secrets { action } => match action {
            SecretsAction::List { target, json } => secrets::list(config, &target, json),
            SecretsAction::Get { target, name, json } => secrets::get(config, &target, &name, json),
            SecretsAction::Set {
                target,
                name,
                value,
                encrypted,
                kind,
                visibility,
                repo_ids,
            } => secrets::set(
                config,
                &target,
                &name,
                secrets::Input {
                    value,
                    encrypted,
                    kind,
                },
                visibility,
                repo_ids,
            ),
            SecretsAction::Rm { target, name } => secrets::rm(config, &target, &name),
            SecretsAction::Repos {
                org,
                name,
                set,
                encrypted_pat,
            } => secrets::repos(config, &org, &name, &set, &encrypted_pat),
        },
        Completions { shell } => completions::execute(shell),
    }
}
