//! Common types, protocol definitions, and errors shared across the UDF crates.

pub mod error;
pub mod protocol;

pub use error::UdfError;
