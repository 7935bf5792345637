//! Secret scopes.
//!
//! A scope is the namespace a secret lives in. It decides the REST path
//! prefix and which cached public key encrypts values for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::validation::validate_scope_field;
use crate::error::{Result, ValidationError};

/// Namespace of a GitHub Actions secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    Repository {
        owner: String,
        repo: String,
    },
    Environment {
        owner: String,
        repo: String,
        environment: String,
    },
    Organization {
        org: String,
    },
}

impl Scope {
    pub fn repository(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::Repository {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn environment(
        owner: impl Into<String>,
        repo: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self::Environment {
            owner: owner.into(),
            repo: repo.into(),
            environment: environment.into(),
        }
    }

    pub fn organization(org: impl Into<String>) -> Self {
        Self::Organization { org: org.into() }
    }

    /// Parse `OWNER/REPO`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidScopeField` if the value is not two
    /// non-empty segments.
    pub fn parse_repository(full_name: &str) -> Result<(String, String)> {
        match full_name.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(ValidationError::InvalidScopeField {
                field: "repository",
                value: full_name.to_string(),
                reason: "expected OWNER/REPO".to_string(),
            }
            .into()),
        }
    }

    /// Check every field is usable as a path segment.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Repository { owner, repo } => {
                validate_scope_field("owner", owner)?;
                validate_scope_field("repo", repo)
            }
            Self::Environment {
                owner,
                repo,
                environment,
            } => {
                validate_scope_field("owner", owner)?;
                validate_scope_field("repo", repo)?;
                validate_scope_field("environment", environment)
            }
            Self::Organization { org } => validate_scope_field("org", org),
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, Self::Organization { .. })
    }

    /// `.../secrets` collection path for this scope.
    pub fn secrets_path(&self) -> String {
        match self {
            Self::Repository { owner, repo } => {
                format!("/repos/{}/{}/actions/secrets", enc(owner), enc(repo))
            }
            Self::Environment {
                owner,
                repo,
                environment,
            } => format!(
                "/repos/{}/{}/environments/{}/secrets",
                enc(owner),
                enc(repo),
                enc(environment)
            ),
            Self::Organization { org } => format!("/orgs/{}/actions/secrets", enc(org)),
        }
    }

    pub fn secret_path(&self, name: &str) -> String {
        format!("{}/{}", self.secrets_path(), enc(name))
    }

    pub fn public_key_path(&self) -> String {
        format!("{}/public-key", self.secrets_path())
    }
}

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository { owner, repo } => write!(f, "repo:{}/{}", owner, repo),
            Self::Environment {
                owner,
                repo,
                environment,
            } => write!(f, "env:{}/{}/{}", owner, repo, environment),
            Self::Organization { org } => write!(f, "org:{}", org),
        }
    }
}
