//! String compression with Base64 text framing.
//!
//! # Format
//!
//! ```text
//! base64(zlib(deflate(utf8(text))))
//! ```
//!
//! [`compress`] always writes the zlib-wrapped stream at the default level.
//! [`decompress`] also accepts a bare DEFLATE stream when the two-byte zlib
//! header is absent.

pub mod deflate;

pub use deflate::{compress, decompress};
