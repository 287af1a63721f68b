//! # Exchange Settlement
//!
//! Per-item custody transfer after acceptance. Trade-scope items go to the
//! offer's proposer; offer-scope items go to the trade owner. The recipient
//! is always read from stored state, never from the caller.

use crate::domain::{
    invariant_address_matches, invariant_offer_accepted, AssetItem, EscrowError, EscrowResult,
    Offer, SettlementKey, Trade,
};
use crate::ports::outbound::ChangeSet;
use es_02_asset_codec::AssetPayload;
use shared_types::{Address, Scope};

/// Addresses and records one settlement works against.
#[derive(Clone, Copy, Debug)]
pub struct SettlementContext<'a> {
    /// Trade address.
    pub trade_address: &'a Address,
    /// Trade record.
    pub trade: &'a Trade,
    /// Offer address named by the key.
    pub offer_address: &'a Address,
    /// Offer record.
    pub offer: &'a Offer,
}

impl SettlementContext<'_> {
    /// Parent address of items escrowed under `scope`.
    pub fn parent_of(&self, scope: Scope) -> Address {
        match scope {
            Scope::Trade => *self.trade_address,
            Scope::Offer => *self.offer_address,
        }
    }

    /// Counterparty receiving items escrowed under `scope`.
    pub fn recipient_of(&self, scope: Scope) -> Address {
        match scope {
            Scope::Trade => self.offer.user,
            Scope::Offer => self.trade.user,
        }
    }
}

/// Validate a settlement key against stored state and name the recipient.
///
/// The caller-declared direction, kind and slot must all agree with the
/// stored item.
pub fn resolve_settlement(
    ctx: &SettlementContext<'_>,
    key: &SettlementKey,
    item_address: &Address,
    item: &AssetItem,
) -> EscrowResult<Address> {
    invariant_offer_accepted(ctx.trade_address, ctx.trade, ctx.offer_address)?;

    // Unreachable through the service, which derives `item_address` from
    // `key.scope`. Kept for callers that load the item some other way.
    if item.scope != key.scope {
        return Err(EscrowError::mismatch("from_type", item.scope, key.scope));
    }
    if item.kind() != key.kind {
        return Err(EscrowError::mismatch("asset_type_code", item.kind(), key.kind));
    }
    if item.slot != key.slot() {
        return Err(EscrowError::mismatch(
            "asset slot",
            format!("{}:{}", item.slot.global_index, item.slot.type_index),
            format!("{}:{}", key.global_index, key.type_index),
        ));
    }
    invariant_address_matches("asset parent", &ctx.parent_of(item.scope), &item.parent)?;

    if item.is_settled() {
        return Err(EscrowError::AlreadySettled(*item_address));
    }

    Ok(ctx.recipient_of(item.scope))
}

/// Append the custody transfer of `item` from its parent to `recipient`.
pub fn custody_transfer(changes: ChangeSet, item: &AssetItem, recipient: Address) -> ChangeSet {
    match &item.payload {
        AssetPayload::Native { amount } => changes.transfer_native(item.parent, recipient, *amount),
        AssetPayload::Token { token_account, .. } => {
            changes.reassign_token_account(*token_account, item.parent, recipient)
        }
    }
}

/// The settlement key naming a stored item.
pub fn settlement_key(trade: &Trade, offer: &Offer, item: &AssetItem) -> SettlementKey {
    SettlementKey {
        trade_index: trade.index,
        offer_index: offer.index,
        scope: item.scope,
        kind: item.kind(),
        global_index: item.slot.global_index,
        type_index: item.slot.type_index,
    }
}

/// Order pending keys: trade side first, then by combined index.
pub fn sort_keys(keys: &mut [SettlementKey]) {
    keys.sort_by_key(|k| (k.scope, k.global_index));
}
