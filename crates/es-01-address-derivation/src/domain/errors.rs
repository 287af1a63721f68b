//! # Domain Errors
//!
//! Error types for Address Derivation.

use thiserror::Error;

/// Address derivation error types.
///
/// Every variant is a programmer error on the caller's side: protocol seed
/// tuples never trigger them, so callers should fail fast rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// A single seed exceeds the per-seed byte limit.
    #[error("Seed {position} is {len} bytes, limit is {max}")]
    SeedTooLong {
        /// Seed position in the tuple.
        position: usize,
        /// Actual length in bytes.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Too many seeds in the tuple.
    #[error("Too many seeds: {count}, limit is {max}")]
    TooManySeeds {
        /// Number of seeds supplied.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The hash output is a valid curve point, so it could have a private key.
    #[error("Derived address lies on the ed25519 curve")]
    OnCurve,

    /// No bump in 0..=255 produced an off-curve address.
    #[error("No viable bump seed found")]
    NoViableBump,

    /// A schema-driven seed could not be encoded.
    #[error("Unknown derivation seed at position {position}: {reason}")]
    UnknownDerivationSeed {
        /// Seed position in the tuple.
        position: usize,
        /// What was wrong with it.
        reason: String,
    },
}
