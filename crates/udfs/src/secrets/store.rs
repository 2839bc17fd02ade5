//! The external secret-store capability and its Secrets Manager implementation.

use aws_sdk_secretsmanager::error::DisplayErrorContext;
use thiserror::Error;
use tracing::debug;

/// Errors reported by a [`SecretStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretStoreError {
    /// The store has no secret with this name.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The secret exists but carries no string value (e.g. binary-only secrets).
    #[error("secret {0} has no string value")]
    NoStringValue(String),

    /// Transport, permission, or service-side failure.
    #[error("secret store request failed: {0}")]
    Backend(String),
}

/// Resolves a secret name to its stored string value.
///
/// The value is expected to be Base64-encoded raw key bytes; decoding and
/// validation belong to [`super::SecretCache`], not the store.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait SecretStore: Send + Sync {
    async fn fetch_secret_value(&self, name: &str) -> Result<String, SecretStoreError>;
}

/// [`SecretStore`] backed by AWS Secrets Manager `GetSecretValue`.
#[derive(Clone, Debug)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

impl SecretStore for SecretsManagerStore {
    async fn fetch_secret_value(&self, name: &str) -> Result<String, SecretStoreError> {
        debug!(secret = %name, "fetching secret from Secrets Manager");
        let resp = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_resource_not_found_exception() => {
                    SecretStoreError::NotFound(name.to_owned())
                }
                _ => SecretStoreError::Backend(DisplayErrorContext(&e).to_string()),
            })?;

        resp.secret_string()
            .map(str::to_owned)
            .ok_or_else(|| SecretStoreError::NoStringValue(name.to_owned()))
    }
}
