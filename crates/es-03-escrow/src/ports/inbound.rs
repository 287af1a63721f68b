//! # Inbound Ports
//!
//! API trait defining what the escrow subsystem can do: six mutators and
//! read-only projections of the four record shapes.

use crate::domain::{
    AssetItem, AssetSlot, Authority, EscrowResult, Offer, SettlementKey, Trade, TradeStatus,
};
use async_trait::async_trait;
use es_02_asset_codec::{encode, AssetPayload, CodecError};
use serde::{Deserialize, Serialize};
use shared_types::{Address, AssetKind, Scope};

/// Request to escrow one asset under a trade or an offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAssetItem {
    /// Side the item goes under.
    pub scope: Scope,
    /// Trade or offer address.
    pub parent: Address,
    /// Who escrows it; must own the parent.
    pub depositor: Address,
    /// Asset type code of `body`.
    pub type_code: u8,
    /// Encoded payload.
    pub body: Vec<u8>,
    /// Slot the caller pre-computed, checked against fresh counters.
    pub expected_slot: Option<AssetSlot>,
}

impl AddAssetItem {
    /// Build a request from a typed payload.
    pub fn new(
        scope: Scope,
        parent: Address,
        depositor: Address,
        payload: &AssetPayload,
    ) -> Result<Self, CodecError> {
        let envelope = encode(payload)?;
        Ok(Self {
            scope,
            parent,
            depositor,
            type_code: envelope.type_code,
            body: envelope.body,
            expected_slot: None,
        })
    }

    /// Require the item to land in `slot`.
    pub fn with_expected_slot(mut self, slot: AssetSlot) -> Self {
        self.expected_slot = Some(slot);
        self
    }
}

/// A newly created trade or offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    /// Derived address.
    pub address: Address,
    /// Sequence index it consumed.
    pub index: u32,
}

/// A newly escrowed asset item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItemReceipt {
    /// Derived address.
    pub address: Address,
    /// Parent it was added to.
    pub parent: Address,
    /// Side it was added under.
    pub scope: Scope,
    /// Asset kind.
    pub kind: AssetKind,
    /// Slot it occupies.
    pub slot: AssetSlot,
}

/// One completed custody transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Key that was settled.
    pub key: SettlementKey,
    /// Asset item address.
    pub asset_item: Address,
    /// New custodian.
    pub recipient: Address,
}

/// Outcome of driving every pending settlement of a trade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    /// Transfers this call performed.
    pub settled: Vec<SettlementReceipt>,
    /// Items another settler finished first.
    pub already_settled: Vec<Address>,
    /// Status after the run.
    pub status: TradeStatus,
}

/// Escrow API - inbound port.
#[async_trait]
pub trait EscrowApi: Send + Sync {
    /// Create the authority singleton. Fails if it already exists.
    async fn initialize(&self, payer: Address) -> EscrowResult<Address>;

    /// Open a trade at the next global index.
    async fn create_trade(
        &self,
        creator: Address,
        allowed_users: Vec<Address>,
    ) -> EscrowResult<Created>;

    /// Open an offer at the trade's next offer index.
    async fn create_offer(&self, trade: Address, proposer: Address) -> EscrowResult<Created>;

    /// Escrow one asset at the parent's next slot.
    async fn add_asset_item(&self, request: AddAssetItem) -> EscrowResult<AssetItemReceipt>;

    /// Latch `offer` as the trade's accepted offer.
    async fn accept_offer(&self, trade: Address, offer: Address, caller: Address)
        -> EscrowResult<()>;

    /// Transfer custody of one asset item to its counterparty.
    async fn settle(&self, key: SettlementKey) -> EscrowResult<SettlementReceipt>;

    /// Settle every pending item of an accepted trade, one operation each.
    async fn settle_remaining(&self, trade: Address) -> EscrowResult<SettlementReport>;

    /// Keys of items not yet settled, trade side first.
    async fn pending_settlements(&self, trade: Address) -> EscrowResult<Vec<SettlementKey>>;

    /// Computed lifecycle status.
    async fn trade_status(&self, trade: Address) -> EscrowResult<TradeStatus>;

    /// Authority projection.
    async fn authority(&self) -> EscrowResult<Option<Authority>>;

    /// Trade projection.
    async fn trade(&self, address: Address) -> EscrowResult<Option<Trade>>;

    /// Offer projection.
    async fn offer(&self, address: Address) -> EscrowResult<Option<Offer>>;

    /// Asset item projection.
    async fn asset_item(&self, address: Address) -> EscrowResult<Option<AssetItem>>;
}
