//! # Codec Errors

use thiserror::Error;

/// Asset codec error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The body does not match the layout declared by the type code.
    #[error("Malformed payload for asset type {type_code}: {reason}")]
    MalformedPayload {
        /// Declared asset type code.
        type_code: u8,
        /// What did not match.
        reason: String,
    },

    /// The serializer itself failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl CodecError {
    pub(crate) fn malformed(type_code: u8, reason: impl Into<String>) -> Self {
        CodecError::MalformedPayload {
            type_code,
            reason: reason.into(),
        }
    }
}
