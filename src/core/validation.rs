//! Input validation for relay operations.
//!
//! Validates secret names, scope fields, and credentials before anything is
//! sent upstream.

use crate::error::{Result, ValidationError};

/// Validate a GitHub Actions secret name.
///
/// GitHub's rules:
/// - Only A-Z, a-z, 0-9, and underscore
/// - Cannot start with a digit
/// - Cannot start with the reserved `GITHUB_` prefix (any case)
/// - Cannot be empty
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyField { field: "secret name" }.into());
    }

    let invalid = |reason: String| -> crate::error::Error {
        ValidationError::InvalidSecretName {
            name: name.to_string(),
            reason,
        }
        .into()
    };

    if let Some(first_char) = name.chars().next() {
        if first_char.is_ascii_digit() {
            return Err(invalid("cannot start with a digit".to_string()));
        }
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(invalid(format!(
                "invalid character '{}' at position {}. Only A-Z, a-z, 0-9, and underscore are allowed",
                ch,
                i + 1
            )));
        }
    }

    if name.to_ascii_uppercase().starts_with("GITHUB_") {
        return Err(invalid("the GITHUB_ prefix is reserved".to_string()));
    }

    Ok(())
}

/// Validate one scope field (owner, repo, environment, org).
///
/// # Errors
///
/// Returns `ValidationError` if the value is empty or contains `/`.
pub fn validate_scope_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field }.into());
    }

    if value.contains('/') {
        return Err(ValidationError::InvalidScopeField {
            field,
            value: value.to_string(),
            reason: "must not contain '/'".to_string(),
        }
        .into());
    }

    Ok(())
}
