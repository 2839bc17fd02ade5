//! Secret-store boundary and the process-lifetime key cache.
//!
//! # Lifecycle
//!
//! 1. An encrypt or decrypt call asks [`SecretCache::get`] for a key by secret name.
//! 2. On a miss the cache issues one [`SecretStore::fetch_secret_value`] call,
//!    Base64-decodes the value and checks it is a 32-byte AES-256 key.
//! 3. Successful keys stay cached for the life of the process. Failures are
//!    not cached; the next call fetches again.
//!
//! # Security invariants
//!
//! - Key bytes are never logged or included in error messages.
//! - [`KeyBytes`] zeroes its buffer on drop and redacts itself in `Debug`.

pub mod cache;
pub mod store;

pub use cache::{KeyBytes, SecretCache, SecretError};
pub use store::{SecretStore, SecretStoreError, SecretsManagerStore};

#[cfg(test)]
pub use store::MockSecretStore;
