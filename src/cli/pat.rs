//! PAT sealing and testing.

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use dialoguer::Password;
use serde_json::json;
use zeroize::Zeroizing;

use crate::cli::payload::finish;
use crate::cli::{gateway, output};
use crate::error::{Result, ValidationError};

/// Seal a PAT for the service key, verifying it with GitHub first unless
/// `no_verify` is set.
pub fn seal(config_path: Option<&Path>, pat: Option<String>, no_verify: bool) -> Result<()> {
    let pat = match pat {
        Some(pat) => Zeroizing::new(pat),
        None => read_pat()?,
    };
    let gateway = gateway(config_path)?;

    if no_verify {
        let encrypted = gateway.guard().encrypt_pat(pat.trim())?;
        return output::json(&json!({
            "success": true,
            "encrypted_pat": encrypted,
            "verified": false,
        }));
    }

    let result = gateway.seal_pat(pat.trim());
    output::json(&result)?;
    finish(result.success, result.error, result.error_type)
}

/// Decrypt an encrypted PAT and test it against GitHub.
pub fn test(config_path: Option<&Path>, encrypted_pat: &str) -> Result<()> {
    let result = gateway(config_path)?.test_pat(encrypted_pat);
    output::json(&result)?;
    finish(result.success, result.error, result.error_type)
}

/// Prompt on a terminal, otherwise read one line from stdin.
fn read_pat() -> Result<Zeroizing<String>> {
    let stdin = std::io::stdin();
    let pat = if stdin.is_terminal() {
        Password::new()
            .with_prompt("GitHub token")
            .interact()?
    } else {
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        line
    };

    let pat = Zeroizing::new(pat);
    if pat.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "pat" }.into());
    }
    Ok(pat)
}
