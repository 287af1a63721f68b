//! # ES-03 Escrow
//!
//! Two-sided escrow: a trade owner escrows assets, counterparties propose
//! offers with their own escrowed assets, the owner latches one offer, and
//! each asset is then settled to the other side one at a time.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (Ports & Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//! initialize ─→ create_trade ─→ add_asset_item (trade side)
//!                    │
//!                    └─→ create_offer ─→ add_asset_item (offer side)
//!                                             │
//!                         accept_offer ←──────┘
//!                              │
//!                              └─→ settle (one item per call)
//! ```
//!
//! ## Security Invariants
//!
//! - Every record lives at an address derived from the program id and its
//!   counters; caller-supplied addresses are recomputed and compared
//! - `accepted_offer` is a one-way latch; nothing is added after it is set
//! - Settlement recipients come from stored state, never from the caller
//! - Each asset item settles at most once
//!
//! ## Module Structure
//!
//! ```text
//! es-03-escrow/
//! ├── domain/          # Records, value objects, invariants, config, errors
//! ├── algorithms/      # Lifecycle transitions, settlement, batch planning
//! ├── ports/           # EscrowApi (inbound), Ledger (outbound)
//! ├── adapters/        # InMemoryLedger
//! └── service.rs       # EscrowService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryLedger;
pub use algorithms::{plan_batch, BatchPlan, PlannedItem};
pub use domain::{
    AssetCounters, AssetItem, AssetSlot, Authority, ConfigError, EscrowConfig, EscrowError,
    EscrowResult, LedgerError, Offer, Record, SettlementKey, Trade, TradeStatus, Versioned,
    DEFAULT_MAX_ALLOWED_USERS, DEFAULT_MAX_CONFLICT_RETRIES,
};
pub use ports::{
    AddAssetItem, AssetItemReceipt, ChangeSet, Created, EscrowApi, Ledger, LedgerWrite,
    SettlementReceipt, SettlementReport, TokenAccount,
};
pub use service::EscrowService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
