//! Tracing setup: structured JSON logs, plus span export over OTLP when an
//! endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext, or ciphertext** may appear in any span
//!   attribute or log field. Secret names are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
