//! # Error Types
//!
//! Errors raised while parsing shared identifiers.

use thiserror::Error;

/// Errors that can occur when building an `Address` from external input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Text is not valid base58.
    #[error("Invalid base58 address: {0}")]
    InvalidBase58(String),

    /// Decoded byte length is not 32.
    #[error("Invalid address length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}
