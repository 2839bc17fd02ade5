//! [`SecretCache`]: concurrency-safe, single-flight cache of decoded keys.

use std::{collections::HashMap, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::UdfError;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use super::store::{SecretStore, SecretStoreError};
use crate::crypto::KEY_LEN;

/// Errors produced while resolving a key by secret name.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The backing store could not resolve the name.
    #[error("secret {name} could not be fetched: {source}")]
    Store {
        name: String,
        #[source]
        source: SecretStoreError,
    },

    /// The stored value is not valid Base64.
    #[error("secret {0} is not valid Base64")]
    InvalidEncoding(String),

    /// The decoded key material has an unexpected length.
    #[error("secret {name} decodes to {len} bytes; expected {KEY_LEN}")]
    InvalidLength { name: String, len: usize },
}

impl From<SecretError> for UdfError {
    fn from(err: SecretError) -> Self {
        UdfError::SecretUnavailable(err.to_string())
    }
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl KeyBytes {
    /// Copy `bytes` into a new key buffer, or `None` if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_LEN {
            return None;
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Some(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}

type Slot = Arc<OnceCell<KeyBytes>>;

/// Process-lifetime cache of decoded keys, keyed by secret name.
///
/// Each name owns a [`OnceCell`] slot, so concurrent first lookups of the same
/// name collapse into a single store fetch and every caller observes the same
/// key. A failed fetch discards its slot once no other caller is waiting on
/// it, so names that never resolve leave nothing behind.
///
/// Entries never expire here. Freshness is the secret-store client's concern.
#[derive(Debug)]
pub struct SecretCache<S> {
    store: S,
    slots: RwLock<HashMap<String, Slot>>,
}

impl<S: SecretStore> SecretCache<S> {
    /// Create a new, empty cache in front of `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the key stored under `name`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError`] if the store cannot resolve the name, or the
    /// value is not Base64 for exactly [`KEY_LEN`] bytes. Nothing is cached
    /// on failure.
    pub async fn get(&self, name: &str) -> Result<KeyBytes, SecretError> {
        let slot = self.slot(name).await;
        match slot.get_or_try_init(|| self.fetch(name)).await {
            Ok(key) => Ok(key.clone()),
            Err(err) => {
                self.discard_unresolved(name, &slot).await;
                Err(err)
            }
        }
    }

    /// Number of secrets with a resolved key.
    pub async fn len(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Return `true` if no key has been resolved yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self.slots.read().await.get(name) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(
            slots
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Remove `slot` from the map if it is still empty and only the map and
    /// this caller hold it. Waiters keep their slot and retry on it.
    async fn discard_unresolved(&self, name: &str, slot: &Slot) {
        let mut slots = self.slots.write().await;
        let unshared = Arc::strong_count(slot) <= 2;
        let current = slots.get(name).is_some_and(|s| Arc::ptr_eq(s, slot));
        if current && unshared && !slot.initialized() {
            slots.remove(name);
            debug!(secret = %name, "unresolved secret slot discarded");
        }
    }

    async fn fetch(&self, name: &str) -> Result<KeyBytes, SecretError> {
        debug!(secret = %name, "secret cache miss");
        let value = self
            .store
            .fetch_secret_value(name)
            .await
            .map_err(|source| {
                warn!(secret = %name, error = %source, "secret fetch failed");
                SecretError::Store {
                    name: name.to_owned(),
                    source,
                }
            })?;

        let mut decoded = STANDARD
            .decode(value.as_bytes())
            .map_err(|_| SecretError::InvalidEncoding(name.to_owned()))?;
        let key = KeyBytes::from_slice(&decoded);
        let len = decoded.len();
        decoded.iter_mut().for_each(|b| *b = 0);

        let key = key.ok_or_else(|| SecretError::InvalidLength {
            name: name.to_owned(),
            len,
        })?;
        info!(secret = %name, "secret resolved and cached");
        Ok(key)
    }
}
