//! # Algorithms Module
//!
//! Pure lifecycle, settlement and planning logic.

pub mod lifecycle;
pub mod planning;
pub mod settlement;

pub use lifecycle::{latch_offer, open_offer, open_trade, place_asset_item, trade_status};
pub use planning::{plan_batch, BatchPlan, PlannedItem};
pub use settlement::{
    custody_transfer, resolve_settlement, settlement_key, sort_keys, SettlementContext,
};
