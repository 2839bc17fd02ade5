//! AWS SDK client initialisation for the Secrets Manager-backed secret store.

pub mod clients;

pub use clients::secrets_manager_client;
