//! # ES-02 Asset Codec
//!
//! Binary envelope for the two escrowable asset variants.
//!
//! **Subsystem ID:** 02
//!
//! ## Purpose
//!
//! Serialize an asset item's payload into the body stored on its record and
//! read it back. The body layout depends only on the asset type code, and a
//! body that does not match its declared layout is `MalformedPayload`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod errors;

// Re-exports
pub use codec::{
    decode, encode, AssetEnvelope, AssetPayload, NATIVE_BODY_LEN, RESERVED_CNFT_CODE,
};
pub use errors::CodecError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
