//! Actions secrets commands (list, get, set, rm, repos).

use std::io::{self, IsTerminal};
use std::path::Path;

use dialoguer::Password;
use serde_json::json;
use zeroize::Zeroizing;

use crate::cli::payload::finish;
use crate::cli::{gateway, output, TargetArgs};
use crate::core::codec::EncryptionKind;
use crate::core::gateway::SetSecretRequest;
use crate::core::relay::{SecretMetadata, Visibility, WriteOptions, WriteOutcome};
use crate::core::types::RepositoryId;
use crate::error::{Error, Result, ValidationError};

/// How `secrets set` received the value.
pub struct Input {
    pub value: Option<String>,
    pub encrypted: Option<String>,
    pub kind: EncryptionKind,
}

/// List secrets in a scope.
pub fn list(config_path: Option<&Path>, target: &TargetArgs, json: bool) -> Result<()> {
    let scope = target.scope()?;
    let secrets = gateway(config_path)?.list_secrets(&target.encrypted_pat, &scope)?;

    if json {
        return output::json(&json!({
            "scope": scope,
            "secrets": secrets,
            "count": secrets.len(),
        }));
    }

    if secrets.is_empty() {
        output::dimmed(&format!("no secrets in {}", scope));
        return Ok(());
    }

    output::section(&format!("{} secrets in {}", secrets.len(), scope));
    for secret in &secrets {
        output::list_item(&describe(secret));
    }
    Ok(())
}

/// Show metadata for one secret.
pub fn get(config_path: Option<&Path>, target: &TargetArgs, name: &str, json: bool) -> Result<()> {
    let scope = target.scope()?;
    let secret = gateway(config_path)?
        .get_secret(&target.encrypted_pat, &scope, name)?
        .ok_or_else(|| Error::Other(format!("{} not found in {}", name, scope)))?;

    if json {
        return output::json(&secret);
    }

    output::header(&secret.name);
    output::kv("created:   ", secret.created_at.to_rfc3339());
    output::kv("updated:   ", secret.updated_at.to_rfc3339());
    if let Some(visibility) = secret.visibility {
        output::kv("visibility:", visibility);
    }
    Ok(())
}

/// Create or update a secret.
///
/// A plaintext value is first sealed for the service key, so it reaches
/// the gateway the same way a remote client's value would.
pub fn set(
    config_path: Option<&Path>,
    target: &TargetArgs,
    name: &str,
    input: Input,
    visibility: Option<Visibility>,
    repo_ids: Vec<RepositoryId>,
) -> Result<()> {
    let scope = target.scope()?;
    let gateway = gateway(config_path)?;

    let encrypted_value = match input.encrypted {
        Some(encrypted) => encrypted,
        None => {
            let value = match input.value {
                Some(value) => Zeroizing::new(value),
                None => read_value(name)?,
            };
            let sealed = gateway.encrypt(&value, input.kind);
            let encrypted = sealed.encrypted.clone();
            match encrypted {
                Some(encrypted) if sealed.success => encrypted,
                _ => return finish(false, sealed.error, sealed.error_type),
            }
        }
    };

    let visibility = match (visibility, repo_ids.is_empty()) {
        (None, false) => Some(Visibility::Selected),
        (visibility, _) => visibility,
    };
    let options = WriteOptions {
        visibility,
        selected_repository_ids: repo_ids,
    };

    let outcome = gateway.set_secret(&SetSecretRequest {
        encrypted_pat: &target.encrypted_pat,
        scope: &scope,
        name,
        encrypted_value: &encrypted_value,
        encryption_type: input.kind,
        options,
    })?;

    let verb = match outcome {
        WriteOutcome::Created => "created",
        WriteOutcome::Updated => "updated",
    };
    output::success(&format!("{} {} in {}", verb, name, scope));
    Ok(())
}

/// Delete a secret.
pub fn rm(config_path: Option<&Path>, target: &TargetArgs, name: &str) -> Result<()> {
    let scope = target.scope()?;
    if gateway(config_path)?.delete_secret(&target.encrypted_pat, &scope, name)? {
        output::success(&format!("deleted {} from {}", name, scope));
    } else {
        output::warn(&format!("{} not found in {}", name, scope));
    }
    Ok(())
}

/// Show, or replace with `set`, the repositories an organization secret is
/// shared with.
pub fn repos(
    config_path: Option<&Path>,
    org: &str,
    name: &str,
    set: &[RepositoryId],
    encrypted_pat: &str,
) -> Result<()> {
    let gateway = gateway(config_path)?;
    let token = gateway.guard().decrypt_pat(encrypted_pat)?;

    if !set.is_empty() {
        gateway.relay().set_selected_repositories(&token, org, name, set)?;
        output::success(&format!("{} shared with {} repositories", name, set.len()));
        return Ok(());
    }

    let repositories = gateway.relay().list_selected_repositories(&token, org, name)?;
    if repositories.is_empty() {
        output::dimmed(&format!("{} is not shared with any repository", name));
        return Ok(());
    }

    output::section(&format!("{} is shared with", name));
    for repo in &repositories {
        let label = repo.full_name.as_deref().unwrap_or(&repo.name);
        output::list_item(&format!("{} ({})", label, repo.id));
    }
    Ok(())
}

fn describe(secret: &SecretMetadata) -> String {
    match secret.visibility {
        Some(visibility) => format!(
            "{}  updated {}  [{}]",
            secret.name,
            secret.updated_at.format("%Y-%m-%d %H:%M"),
            visibility
        ),
        None => format!("{}  updated {}", secret.name, secret.updated_at.format("%Y-%m-%d %H:%M")),
    }
}

fn read_value(name: &str) -> Result<Zeroizing<String>> {
    let value = if io::stdin().is_terminal() {
        Password::new()
            .with_prompt(format!("Value for {}", name))
            .interact()?
    } else {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        input.trim_end_matches(['\r', '\n']).to_string()
    };

    if value.is_empty() {
        return Err(ValidationError::EmptyField { field: "value" }.into());
    }
    Ok(Zeroizing::new(value))
}
