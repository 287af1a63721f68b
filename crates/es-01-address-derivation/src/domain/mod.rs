//! # Domain Module
//!
//! Seed model and errors for Address Derivation.

pub mod errors;
pub mod seeds;

pub use errors::*;
pub use seeds::*;
