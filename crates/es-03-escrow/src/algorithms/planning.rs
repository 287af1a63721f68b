//! # Batch Planning
//!
//! There is no multi-asset atomic add. A client escrowing several assets
//! plans every slot and address up front from the parent's counters, then
//! submits one add per item. After an interruption it re-reads the counters
//! and continues from the first item that did not land.

use crate::domain::{AssetCounters, AssetSlot, EscrowResult};
use es_01_address_derivation::AddressDeriver;
use es_02_asset_codec::AssetPayload;
use serde::{Deserialize, Serialize};
use shared_types::{Address, AssetKind};

/// One planned addition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedItem {
    /// Payload to submit.
    pub payload: AssetPayload,
    /// Asset kind.
    pub kind: AssetKind,
    /// Slot it will occupy.
    pub slot: AssetSlot,
    /// Address it will be created at.
    pub address: Address,
}

/// Every addition of a batch, in submission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    /// Parent the batch goes under.
    pub parent: Address,
    /// Counters the plan was computed from.
    pub start: AssetCounters,
    /// Planned items.
    pub items: Vec<PlannedItem>,
}

impl BatchPlan {
    /// Items not yet added, given freshly read parent counters.
    ///
    /// Only the parent's owner adds to it, so every item below the current
    /// combined count has landed.
    pub fn remaining(&self, current: &AssetCounters) -> &[PlannedItem] {
        let done = current.asset_count.saturating_sub(self.start.asset_count) as usize;
        &self.items[done.min(self.items.len())..]
    }

    /// Counters once every item has landed.
    pub fn end(&self) -> AssetCounters {
        self.items
            .iter()
            .fold(self.start, |mut c, item| {
                c.asset_count = c.asset_count.saturating_add(1);
                match item.kind {
                    AssetKind::Native => c.native_count = c.native_count.saturating_add(1),
                    AssetKind::Token => c.token_count = c.token_count.saturating_add(1),
                }
                c
            })
    }
}

/// Plan `payloads` under `parent` starting from `counters`.
pub fn plan_batch(
    deriver: &AddressDeriver,
    parent: Address,
    counters: &AssetCounters,
    payloads: Vec<AssetPayload>,
) -> EscrowResult<BatchPlan> {
    let start = *counters;
    let mut cursor = start;
    let mut items = Vec::with_capacity(payloads.len());

    for payload in payloads {
        let kind = payload.kind();
        let slot = cursor.next_slot(kind);
        let address = deriver.asset_item(&parent, kind, slot.type_index)?.address;
        cursor = cursor.advanced(kind)?;
        items.push(PlannedItem {
            payload,
            kind,
            slot,
            address,
        });
    }

    Ok(BatchPlan {
        parent,
        start,
        items,
    })
}
