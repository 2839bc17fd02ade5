//! AES-256-GCM envelope encryption of text values.
//!
//! This module has no AWS or HTTP dependencies; keys arrive through
//! [`crate::secrets::SecretCache`].
//!
//! # Ciphertext format
//!
//! ```text
//! base64(nonce[12] || ciphertext || tag[16])
//! ```
//!
//! Standard Base64 alphabet with padding.

pub mod cipher;
pub mod envelope;

pub use cipher::{KEY_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::{decrypt, encrypt};
