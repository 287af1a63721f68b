//! # Trade/Offer Lifecycle
//!
//! Pure transitions: each takes freshly read records and returns the
//! records to write. Nothing here touches the ledger.

use crate::domain::{
    invariant_address_matches, invariant_allow_list, invariant_counterparty, invariant_next_slot,
    invariant_owner, invariant_positive_amount, invariant_trade_open, invariant_undecided,
    AssetCounters, AssetItem, AssetSlot, Authority, EscrowError, EscrowResult, Offer, Trade,
    TradeStatus,
};
use es_02_asset_codec::AssetPayload;
use shared_types::{Address, Scope};

/// Consume the authority's next trade index.
///
/// Returns the advanced authority and the new trade.
pub fn open_trade(
    authority: &Authority,
    creator: Address,
    allowed_users: Vec<Address>,
    max_allowed_users: usize,
) -> EscrowResult<(Authority, Trade)> {
    invariant_allow_list(&creator, &allowed_users, max_allowed_users)?;

    let index = authority.trade_count;
    let next = Authority {
        user: authority.user,
        trade_count: index
            .checked_add(1)
            .ok_or(EscrowError::CounterOverflow("trade_count"))?,
    };
    Ok((next, Trade::new(index, creator, allowed_users)))
}

/// Consume the trade's next offer index.
///
/// Returns the advanced trade and the new offer.
pub fn open_offer(
    trade_address: &Address,
    trade: &Trade,
    proposer: Address,
) -> EscrowResult<(Trade, Offer)> {
    invariant_trade_open(trade_address, trade)?;
    invariant_counterparty(trade, &proposer)?;

    let index = trade.offer_count;
    let mut next = trade.clone();
    next.offer_count = index
        .checked_add(1)
        .ok_or(EscrowError::CounterOverflow("offer_count"))?;
    Ok((next, Offer::new(index, *trade_address, proposer)))
}

/// Place one asset at the parent's next slot for its kind.
///
/// Returns the advanced counters and the new item. `expected_slot` lets a
/// resuming client assert the slot it pre-computed.
pub fn place_asset_item(
    scope: Scope,
    parent: Address,
    counters: &AssetCounters,
    depositor: Address,
    payload: AssetPayload,
    expected_slot: Option<AssetSlot>,
) -> EscrowResult<(AssetCounters, AssetItem)> {
    let kind = payload.kind();
    let slot = counters.next_slot(kind);
    if let Some(expected) = expected_slot {
        invariant_next_slot(counters, kind, &expected)?;
    }
    invariant_positive_amount(&payload)?;

    let advanced = counters.advanced(kind)?;
    let item = AssetItem {
        scope,
        parent,
        slot,
        depositor,
        payload,
        settled_to: None,
    };
    Ok((advanced, item))
}

/// Latch `offer` as the trade's accepted offer.
///
/// `derived_offer` is the address recomputed from the trade and the offer's
/// recorded index; it must equal the address the caller named.
pub fn latch_offer(
    trade_address: &Address,
    trade: &Trade,
    offer_address: &Address,
    offer: &Offer,
    derived_offer: &Address,
    caller: &Address,
) -> EscrowResult<Trade> {
    invariant_undecided(trade_address, trade)?;
    invariant_owner(&trade.user, caller)?;
    invariant_address_matches("offer trade", trade_address, &offer.trade)?;
    invariant_address_matches("offer", derived_offer, offer_address)?;
    if offer.index >= trade.offer_count {
        return Err(EscrowError::mismatch(
            "offer index",
            format!("< {}", trade.offer_count),
            offer.index,
        ));
    }

    let mut next = trade.clone();
    next.accepted_offer = Some(*offer_address);
    Ok(next)
}

/// Lifecycle status from a trade and, once decided, its accepted offer.
///
/// A decided trade with nothing escrowed on either side is already settled.
pub fn trade_status(trade: &Trade, accepted: Option<&Offer>) -> TradeStatus {
    let offer = match (trade.accepted_offer, accepted) {
        (Some(_), Some(offer)) => offer,
        _ => return TradeStatus::Open,
    };

    let total = u64::from(trade.assets.asset_count) + u64::from(offer.assets.asset_count);
    let settled = u64::from(trade.settled_count) + u64::from(offer.settled_count);
    if settled >= total {
        TradeStatus::Settled
    } else if settled == 0 {
        TradeStatus::Accepted
    } else {
        TradeStatus::Settling
    }
}
