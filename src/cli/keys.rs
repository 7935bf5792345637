//! Service key generation.

use std::path::Path;

use serde_json::json;
use tracing::info;

use crate::cli::output;
use crate::core::cipher::KeyPair;
use crate::core::config::Config;
use crate::error::{ConfigError, Result};

/// Generate a key pair, print it, and optionally store it in the config.
///
/// When saving, the private key is written to the config file and never
/// printed.
pub fn keygen(config_path: Option<&Path>, json: bool, save: bool, force: bool) -> Result<()> {
    let pair = KeyPair::generate();
    let fingerprint = pair.fingerprint();

    if save {
        let path = Config::resolve_path(config_path)?;
        let mut config = if path.exists() {
            Config::from_file(&path)?
        } else {
            Config::default()
        };

        if config.keys.private_key.is_some() && !force {
            return Err(ConfigError::InvalidValue {
                field: "keys.private_key",
                reason: format!("{} already holds a key pair; pass --force to replace it", path.display()),
            }
            .into());
        }

        config.set_keys(&pair);
        config.save(&path)?;
        info!(path = %path.display(), fingerprint = %fingerprint, "key pair saved");

        if json {
            return output::json(&json!({
                "public_key": pair.public_key(),
                "fingerprint": fingerprint,
                "path": path.display().to_string(),
            }));
        }

        output::success(&format!("key pair saved to {}", path.display()));
        output::kv("public key: ", pair.public_key());
        output::kv("fingerprint:", &fingerprint);
        return Ok(());
    }

    if json {
        return output::json(&json!({
            "public_key": pair.public_key(),
            "private_key": pair.private_key(),
            "fingerprint": fingerprint,
        }));
    }

    output::header("Service key pair");
    output::kv("public key: ", pair.public_key());
    output::kv("private key:", pair.private_key());
    output::kv("fingerprint:", &fingerprint);
    println!();
    output::hint(&format!(
        "keep the private key secret; {} stores it for you",
        output::cmd("ghseal keygen --save")
    ));
    Ok(())
}
