//! # Escrow Swap Test Suite
//!
//! Unified test crate driving the escrow service end to end over the
//! in-memory ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── swap_flows.rs          # Full swaps, token and native
//!     ├── settlement_recovery.rs # Interrupted settlement and batch resume
//!     └── concurrency.rs         # Racing creators, offers and settlers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p es-tests
//! cargo test -p es-tests integration::concurrency
//! RUST_LOG=es_03_escrow=debug cargo test -p es-tests -- --nocapture
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]
