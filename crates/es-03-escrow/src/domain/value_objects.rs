//! # Domain Value Objects
//!
//! Counters, slots, statuses and settlement keys.

use super::errors::{EscrowError, EscrowResult};
use serde::{Deserialize, Serialize};
use shared_types::{AssetKind, Scope};
use std::fmt;

/// Asset sequence counters owned by a Trade or an Offer.
///
/// `asset_count` spans both kinds; each kind also has its own sub-sequence.
/// The two run independently and diverge once both kinds are used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetCounters {
    /// Next free combined index.
    pub asset_count: u32,
    /// Next free native index.
    pub native_count: u32,
    /// Next free token index.
    pub token_count: u32,
}

impl AssetCounters {
    /// Next free index within `kind`'s sub-sequence.
    pub fn count(&self, kind: AssetKind) -> u32 {
        match kind {
            AssetKind::Native => self.native_count,
            AssetKind::Token => self.token_count,
        }
    }

    /// Slot the next item of `kind` will occupy.
    pub fn next_slot(&self, kind: AssetKind) -> AssetSlot {
        AssetSlot {
            global_index: self.asset_count,
            type_index: self.count(kind),
        }
    }

    /// Counters after one item of `kind` is added.
    pub fn advanced(&self, kind: AssetKind) -> EscrowResult<Self> {
        let mut next = *self;
        next.asset_count = next
            .asset_count
            .checked_add(1)
            .ok_or(EscrowError::CounterOverflow("asset_count"))?;
        match kind {
            AssetKind::Native => {
                next.native_count = next
                    .native_count
                    .checked_add(1)
                    .ok_or(EscrowError::CounterOverflow("native_count"))?;
            }
            AssetKind::Token => {
                next.token_count = next
                    .token_count
                    .checked_add(1)
                    .ok_or(EscrowError::CounterOverflow("token_count"))?;
            }
        }
        Ok(next)
    }
}

/// Position of one asset item inside its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetSlot {
    /// Pre-increment value of the parent's `asset_count`.
    pub global_index: u32,
    /// Pre-increment value of the parent's kind counter.
    pub type_index: u32,
}

/// Client-observed trade status.
///
/// Not stored: computed from the trade, its accepted offer and their
/// settled counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Accepting assets and offers.
    Open,
    /// An offer is latched, nothing settled yet.
    Accepted,
    /// Some but not all items settled.
    Settling,
    /// Every item known at acceptance settled.
    Settled,
}

impl TradeStatus {
    /// Whether new assets and offers may still be added.
    pub fn accepts_additions(&self) -> bool {
        matches!(self, TradeStatus::Open)
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Settled)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeStatus::Open => "open",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Settling => "settling",
            TradeStatus::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// Full derivation key of one asset item to settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementKey {
    /// Global trade index.
    pub trade_index: u32,
    /// Offer index within the trade.
    pub offer_index: u32,
    /// Side the item was escrowed under (`from_type`).
    pub scope: Scope,
    /// Asset kind (`asset_type_code`).
    pub kind: AssetKind,
    /// Position in the parent's combined sequence.
    pub global_index: u32,
    /// Position in the parent's kind sub-sequence.
    pub type_index: u32,
}

impl SettlementKey {
    /// Build a key from raw wire codes.
    pub fn from_codes(
        trade_index: u32,
        offer_index: u32,
        from_type: u8,
        asset_type_code: u8,
        global_index: u32,
        type_index: u32,
    ) -> EscrowResult<Self> {
        let scope = Scope::from_code(from_type).ok_or(EscrowError::UnknownCode {
            field: "from_type",
            code: from_type,
        })?;
        let kind = AssetKind::from_code(asset_type_code).ok_or(EscrowError::UnknownCode {
            field: "asset_type_code",
            code: asset_type_code,
        })?;
        Ok(Self {
            trade_index,
            offer_index,
            scope,
            kind,
            global_index,
            type_index,
        })
    }

    /// Slot named by this key.
    pub fn slot(&self) -> AssetSlot {
        AssetSlot {
            global_index: self.global_index,
            type_index: self.type_index,
        }
    }
}

impl fmt::Display for SettlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trade {}/offer {}/{}/{}#{}:{}",
            self.trade_index,
            self.offer_index,
            self.scope,
            self.kind,
            self.global_index,
            self.type_index
        )
    }
}
