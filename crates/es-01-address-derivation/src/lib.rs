//! # ES-01 Address Derivation
//!
//! Deterministic, collision-free addresses for every escrow record.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Domain + Algorithms + Service
//!
//! ## Purpose
//!
//! Map a program id and an ordered tuple of typed seeds to a 32-byte address
//! plus the bump that pushed it off the ed25519 curve:
//! - Pure: no ledger or network access, identical for every client
//! - Positional seed encoding with explicit integer widths
//! - Fixed seed tuples for authority, trade, offer and asset item records
//!
//! ## Module Structure
//!
//! ```text
//! es-01-address-derivation/
//! ├── domain/          # Seed, SeedSchema, DerivedAddress, errors
//! ├── algorithms/      # create/find program address
//! └── service.rs       # AddressDeriver
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod service;

// Re-exports
pub use algorithms::{create_program_address, find_program_address, is_on_curve};
pub use domain::{
    DerivationError, DerivedAddress, Seed, SeedSchema, SeedValue, SeedWidth, AUTHORITY_SEED,
    MAX_SEEDS, MAX_SEED_LEN, OFFER_SEED, PDA_MARKER, TRADE_SEED,
};
pub use service::{AddressDeriver, AssetItemAddress};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
