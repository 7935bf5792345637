//! Secrets API types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{KeyId, RepositoryId, SecretName};
use crate::error::{Result, ValidationError};

/// A scope's GitHub-issued public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePublicKey {
    pub key_id: KeyId,
    /// Base64 Curve25519 public key.
    pub key: String,
}

/// Who can use an organization secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    All,
    Private,
    Selected,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Private => "private",
            Self::Selected => "selected",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "private" => Ok(Self::Private),
            "selected" => Ok(Self::Selected),
            other => Err(ValidationError::InvalidVisibility(other.to_string())),
        }
    }
}

/// Metadata GitHub returns for a secret. There is no value field: GitHub
/// never returns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub name: SecretName,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_repositories_url: Option<String>,
}

/// One page of `GET .../secrets`.
#[derive(Debug, Deserialize)]
pub(crate) struct SecretPage {
    pub total_count: usize,
    #[serde(default)]
    pub secrets: Vec<SecretMetadata>,
}

/// A repository an organization secret is shared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedRepository {
    pub id: RepositoryId,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectedRepositoryPage {
    #[serde(default)]
    pub repositories: Vec<SelectedRepository>,
}

/// Which of create or update a write performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    /// GitHub answered 201.
    Created,
    /// GitHub answered 204.
    Updated,
}

impl WriteOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            201 => Self::Created,
            _ => Self::Updated,
        }
    }
}

/// Extra fields sent on organization writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Defaults to `private` for organization secrets; ignored elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_repository_ids: Vec<RepositoryId>,
}

impl WriteOptions {
    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            selected_repository_ids: Vec::new(),
        }
    }

    pub fn selected(ids: Vec<RepositoryId>) -> Self {
        Self {
            visibility: Some(Visibility::Selected),
            selected_repository_ids: ids,
        }
    }

    /// `selected` needs at least one repository, and repository ids need
    /// `selected`.
    pub fn validate(&self) -> Result<()> {
        match (self.visibility, self.selected_repository_ids.is_empty()) {
            (Some(Visibility::Selected), true) => Err(ValidationError::MissingSelectedRepositories.into()),
            (Some(Visibility::Selected), false) | (_, true) => Ok(()),
            (other, false) => {
                let named = other.map_or("private (default)", |v| v.as_str());
                Err(ValidationError::UnexpectedSelectedRepositories(named.to_string()).into())
            }
        }
    }
}
