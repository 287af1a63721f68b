//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the escrow subsystem.

mod in_memory_ledger;

pub use in_memory_ledger::InMemoryLedger;
