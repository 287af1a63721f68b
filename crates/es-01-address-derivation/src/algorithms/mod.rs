//! # Algorithms Module
//!
//! Program-derived address search.

pub mod program_address;

pub use program_address::{create_program_address, find_program_address, is_on_curve};
