//! Stateless data-transformation functions invoked by a query engine's UDF
//! dispatcher.
//!
//! - [`codec`] — zlib/DEFLATE compression with Base64 text framing.
//! - [`clickstream`] — GZIP-wrapped event payloads re-encoded into known record shapes.
//! - [`crypto`] — AES-256-GCM envelopes keyed by secrets from an external store.
//! - [`secrets`] — the secret-store boundary and the process-lifetime key cache.
//! - [`functions`] — the name-to-operation mapping exposed to the host.

pub mod clickstream;
pub mod codec;
pub mod crypto;
pub mod functions;
pub mod secrets;

pub use functions::{UdfFunction, Udfs};
