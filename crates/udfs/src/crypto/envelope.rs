//! Text-level encrypt/decrypt of nullable values with keys resolved by secret name.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::UdfError;
use tracing::debug;

use super::cipher::{self, CipherError};
use crate::secrets::{SecretCache, SecretStore};

/// Encrypt `plaintext` with the key stored under `secret_name`.
///
/// Output is `base64(nonce || ciphertext || tag)`. A `None` plaintext returns
/// `None` without touching the secret store.
///
/// # Errors
///
/// [`UdfError::SecretUnavailable`] if the key cannot be resolved;
/// [`UdfError::EncryptionFailure`] on a cipher-level error.
pub async fn encrypt<S: SecretStore>(
    plaintext: Option<&str>,
    secret_name: &str,
    secrets: &SecretCache<S>,
) -> Result<Option<String>, UdfError> {
    let Some(plaintext) = plaintext else {
        return Ok(None);
    };

    let key = secrets.get(secret_name).await?;
    let sealed = cipher::seal(plaintext.as_bytes(), key.as_bytes())
        .map_err(|e| UdfError::EncryptionFailure(e.to_string()))?;

    debug!(secret = %secret_name, sealed_len = sealed.len(), "value encrypted");
    Ok(Some(STANDARD.encode(sealed)))
}

/// Decrypt a value produced by [`encrypt`] with the key stored under `secret_name`.
///
/// A `None` ciphertext returns `None` without touching the secret store.
///
/// # Errors
///
/// [`UdfError::SecretUnavailable`] if the key cannot be resolved;
/// [`UdfError::DecryptionFailure`] for invalid Base64, input shorter than
/// nonce + tag, a failed tag check, or plaintext that is not UTF-8.
pub async fn decrypt<S: SecretStore>(
    ciphertext: Option<&str>,
    secret_name: &str,
    secrets: &SecretCache<S>,
) -> Result<Option<String>, UdfError> {
    let Some(ciphertext) = ciphertext else {
        return Ok(None);
    };

    let key = secrets.get(secret_name).await?;
    let sealed = STANDARD
        .decode(ciphertext)
        .map_err(|e| UdfError::DecryptionFailure(format!("invalid Base64: {e}")))?;

    let plaintext = cipher::open(&sealed, key.as_bytes()).map_err(|e| match e {
        CipherError::AeadFailure => {
            UdfError::DecryptionFailure("authentication tag verification failed".into())
        }
        other => UdfError::DecryptionFailure(other.to_string()),
    })?;

    String::from_utf8(plaintext)
        .map(Some)
        .map_err(|_| UdfError::DecryptionFailure("plaintext is not valid UTF-8".into()))
}
