//! encrypt / decrypt / validate commands.
//!
//! Results are printed as JSON whatever the outcome; a failed result also
//! makes the command exit non-zero.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::{load_config, output};
use crate::core::codec::{EncryptionKind, PayloadCodec};
use crate::core::types::HexKey;
use crate::error::{Error, ErrorKind, Result};

/// Encrypt `value` for an explicit public key or the configured one.
pub fn encrypt(
    config_path: Option<&Path>,
    value: &str,
    kind: EncryptionKind,
    public_key: Option<&str>,
) -> Result<()> {
    let public_key: HexKey = match public_key {
        Some(key) => key.to_string(),
        None => load_config(config_path)?.service_keys()?.public_key().to_string(),
    };

    let result = PayloadCodec::new().encrypt(value, kind, &public_key);
    output::json(&result)?;
    finish(result.success, result.error, result.error_type)
}

/// Decrypt `payload` with an explicit private key or the configured one.
pub fn decrypt(
    config_path: Option<&Path>,
    payload: &str,
    kind: EncryptionKind,
    private_key: Option<&str>,
) -> Result<()> {
    let private_key = resolve_private(config_path, private_key)?;
    let result = PayloadCodec::new().decrypt(payload, kind, &private_key);
    output::json(&result)?;
    finish(result.success, result.error, result.error_type)
}

pub fn validate(
    config_path: Option<&Path>,
    payload: &str,
    kind: EncryptionKind,
    private_key: Option<&str>,
) -> Result<()> {
    let private_key = resolve_private(config_path, private_key)?;
    let result = PayloadCodec::new().validate(payload, kind, &private_key);
    output::json(&result)?;
    finish(result.can_decrypt, result.error, result.error_type)
}

fn resolve_private(config_path: Option<&Path>, private_key: Option<&str>) -> Result<Zeroizing<HexKey>> {
    match private_key {
        Some(key) => Ok(Zeroizing::new(key.to_string())),
        None => {
            let pair = load_config(config_path)?.service_keys()?;
            Ok(Zeroizing::new(pair.private_key().to_string()))
        }
    }
}

/// Turn a failed result into a command error after it has been printed.
pub(crate) fn finish(success: bool, error: Option<String>, kind: Option<ErrorKind>) -> Result<()> {
    if success {
        return Ok(());
    }
    let kind = kind.unwrap_or(ErrorKind::ServerError);
    let message = error.unwrap_or_else(|| "operation failed".to_string());
    Err(Error::Other(format!("{}: {}", kind, message)))
}
