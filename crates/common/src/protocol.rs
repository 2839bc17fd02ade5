//! Request and response types exchanged with the host dispatcher.
//!
//! The host marshals each batch of rows for a single named function into an
//! [`InvokeRequest`]; every UDF argument and result is nullable text.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Invoke endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /invoke`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Exported function name, e.g. `"encrypt"`.
    pub function: String,
    /// One argument list per row. `null` arguments are passed through as `None`.
    pub rows: Vec<Vec<Option<String>>>,
}

/// Successful response body for `POST /invoke`.
///
/// `values[i]` is the result for `rows[i]` of the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub values: Vec<Option<String>>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"decryption_failure"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::UdfError> for ErrorResponse {
    fn from(err: &crate::UdfError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status, always `"ok"` while the process serves requests.
    pub status: String,
    /// Number of secrets currently held in the key cache.
    pub secrets_cached: usize,
}
