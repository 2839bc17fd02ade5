//! Host-facing error type returned by every UDF operation.

use thiserror::Error;

/// Error raised to the host dispatcher by a UDF invocation.
///
/// None of these are retried inside the library: bad input stays bad, and an
/// unavailable secret needs external remediation.
///
/// Variants map to HTTP status codes when served over the invocation endpoint:
/// - [`UdfError::SecretUnavailable`] → 503
/// - [`UdfError::EncryptionFailure`], [`UdfError::Internal`] → 500
/// - everything else → 400
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UdfError {
    /// The named secret could not be resolved, or its value is not a valid
    /// Base64-encoded key of the expected length.
    #[error("secret unavailable: {0}")]
    SecretUnavailable(String),

    /// Invalid Base64, an invalid or truncated DEFLATE/GZIP stream, or JSON that
    /// does not match the target record shape.
    #[error("malformed compressed data: {0}")]
    MalformedCompressedData(String),

    /// The AEAD cipher rejected an encryption request.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// Authentication-tag mismatch, short ciphertext, or undecodable plaintext.
    #[error("decryption failure: {0}")]
    DecryptionFailure(String),

    /// The host asked for a function this library does not export.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong argument count or a required argument was null.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UdfError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            UdfError::SecretUnavailable(_) => 503,
            UdfError::EncryptionFailure(_) | UdfError::Internal(_) => 500,
            UdfError::MalformedCompressedData(_)
            | UdfError::DecryptionFailure(_)
            | UdfError::UnknownFunction(_)
            | UdfError::InvalidArguments(_) => 400,
        }
    }

    /// Short machine-readable error code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            UdfError::SecretUnavailable(_) => "secret_unavailable",
            UdfError::MalformedCompressedData(_) => "malformed_compressed_data",
            UdfError::EncryptionFailure(_) => "encryption_failure",
            UdfError::DecryptionFailure(_) => "decryption_failure",
            UdfError::UnknownFunction(_) => "unknown_function",
            UdfError::InvalidArguments(_) => "invalid_arguments",
            UdfError::Internal(_) => "internal_error",
        }
    }
}
