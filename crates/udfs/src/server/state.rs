//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use udfs::{secrets::SecretsManagerStore, Udfs};

/// Application state shared across all request handlers.
///
/// Cheap to clone: the library and its key cache sit behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The UDF library and its process-lifetime key cache.
    pub udfs: Arc<Udfs<SecretsManagerStore>>,
    /// Largest number of rows accepted in one invocation.
    pub max_batch_rows: usize,
}

impl AppState {
    /// Create a new [`AppState`] around `udfs`.
    pub fn new(udfs: Udfs<SecretsManagerStore>, max_batch_rows: usize) -> Self {
        Self {
            udfs: Arc::new(udfs),
            max_batch_rows,
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// State backed by an offline Secrets Manager client, suitable for tests
    /// that never resolve a secret.
    fn default() -> Self {
        use aws_sdk_secretsmanager::config::{BehaviorVersion, Credentials, Region};

        let conf = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .build();
        let client = aws_sdk_secretsmanager::Client::from_conf(conf);
        Self::new(Udfs::new(SecretsManagerStore::new(client)), 4)
    }
}
