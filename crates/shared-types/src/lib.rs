//! # Shared Types Crate
//!
//! This crate contains the identifiers every escrow subsystem speaks in.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Address`, `AssetKind` and `Scope` are defined
//!   here and nowhere else.
//! - **Wire Codes Are Stable**: the numeric codes of `AssetKind` and `Scope`
//!   appear in derivation seeds and settlement keys, so they never change.
//! - **Canonical Text**: an `Address` renders as base58 and parses back from it.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
