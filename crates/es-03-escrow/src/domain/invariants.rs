//! # Domain Invariants
//!
//! Business rules every escrow operation is checked against.

use super::entities::Trade;
use super::errors::{EscrowError, EscrowResult};
use super::value_objects::{AssetCounters, AssetSlot};
use es_02_asset_codec::AssetPayload;
use shared_types::{Address, AssetKind};

/// Default cap on a trade's allow-list.
pub const DEFAULT_MAX_ALLOWED_USERS: usize = 5;

/// Invariant: additions only while the trade is undecided.
///
/// Covers both new offers and new asset items, on either side.
pub fn invariant_trade_open(trade_address: &Address, trade: &Trade) -> EscrowResult<()> {
    match trade.accepted_offer {
        Some(accepted) => Err(EscrowError::OutOfSequence(format!(
            "trade {trade_address} already accepted offer {accepted}"
        ))),
        None => Ok(()),
    }
}

/// Invariant: `accepted_offer` is a one-way latch.
pub fn invariant_undecided(trade_address: &Address, trade: &Trade) -> EscrowResult<()> {
    match trade.accepted_offer {
        Some(accepted) => Err(EscrowError::AlreadyDecided {
            trade: *trade_address,
            accepted,
        }),
        None => Ok(()),
    }
}

/// Invariant: settlement only runs against the latched offer.
pub fn invariant_offer_accepted(
    trade_address: &Address,
    trade: &Trade,
    offer_address: &Address,
) -> EscrowResult<()> {
    match trade.accepted_offer {
        None => Err(EscrowError::OutOfSequence(format!(
            "trade {trade_address} has not accepted an offer"
        ))),
        Some(accepted) if accepted != *offer_address => {
            Err(EscrowError::OfferNotAccepted(*offer_address))
        }
        Some(_) => Ok(()),
    }
}

/// Invariant: only the recorded owner acts on its record.
pub fn invariant_owner(expected: &Address, actual: &Address) -> EscrowResult<()> {
    if expected != actual {
        return Err(EscrowError::NotOwner {
            expected: *expected,
            actual: *actual,
        });
    }
    Ok(())
}

/// Invariant: offers come from an admitted counterparty, never the owner.
pub fn invariant_counterparty(trade: &Trade, proposer: &Address) -> EscrowResult<()> {
    if *proposer == trade.user || !trade.admits(proposer) {
        return Err(EscrowError::NotAllowed(*proposer));
    }
    Ok(())
}

/// Invariant: allow-list is bounded and excludes the creator.
pub fn invariant_allow_list(
    creator: &Address,
    allowed_users: &[Address],
    max: usize,
) -> EscrowResult<()> {
    if allowed_users.len() > max {
        return Err(EscrowError::TooManyAllowedUsers {
            count: allowed_users.len(),
            max,
        });
    }
    if allowed_users.contains(creator) {
        return Err(EscrowError::NotAllowed(*creator));
    }
    Ok(())
}

/// Invariant: a new item takes exactly the parent's next slot for its kind.
///
/// `global_index` is the pre-increment combined count and `type_index` the
/// pre-increment kind count.
pub fn invariant_next_slot(
    counters: &AssetCounters,
    kind: AssetKind,
    slot: &AssetSlot,
) -> EscrowResult<()> {
    let expected = counters.next_slot(kind);
    if expected != *slot {
        return Err(EscrowError::mismatch(
            "asset slot",
            format!("{}:{}", expected.global_index, expected.type_index),
            format!("{}:{}", slot.global_index, slot.type_index),
        ));
    }
    Ok(())
}

/// Invariant: a caller-supplied address equals the recomputed derivation.
pub fn invariant_address_matches(
    what: &'static str,
    expected: &Address,
    actual: &Address,
) -> EscrowResult<()> {
    if expected != actual {
        return Err(EscrowError::mismatch(what, expected, actual));
    }
    Ok(())
}

/// Invariant: native items carry a non-zero amount.
pub fn invariant_positive_amount(payload: &AssetPayload) -> EscrowResult<()> {
    if let AssetPayload::Native { amount: 0 } = payload {
        return Err(EscrowError::InvalidAmount);
    }
    Ok(())
}
