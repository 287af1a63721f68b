//! # Domain Entities
//!
//! The four escrow record shapes and the versioned wrapper the ledger
//! stores them in.

use super::value_objects::{AssetCounters, AssetSlot};
use es_02_asset_codec::{encode, AssetEnvelope, AssetPayload, CodecError};
use serde::{Deserialize, Serialize};
use shared_types::{Address, AssetKind, Scope};

/// Deployment singleton holding the global trade sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Who initialized the deployment.
    pub user: Address,
    /// Next free global trade index.
    pub trade_count: u32,
}

/// One negotiation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Position in the global trade sequence.
    pub index: u32,
    /// Trade owner.
    pub user: Address,
    /// Next free offer index.
    pub offer_count: u32,
    /// Trade-scope asset counters.
    pub assets: AssetCounters,
    /// Offer latched at acceptance.
    pub accepted_offer: Option<Address>,
    /// Counterparties allowed to make offers; empty means anyone.
    pub allowed_users: Vec<Address>,
    /// Trade-scope items already settled.
    pub settled_count: u32,
}

impl Trade {
    /// A fresh trade with every counter at zero.
    pub fn new(index: u32, user: Address, allowed_users: Vec<Address>) -> Self {
        Self {
            index,
            user,
            offer_count: 0,
            assets: AssetCounters::default(),
            accepted_offer: None,
            allowed_users,
            settled_count: 0,
        }
    }

    /// Whether an offer has been accepted.
    pub fn is_decided(&self) -> bool {
        self.accepted_offer.is_some()
    }

    /// Whether `user` may propose an offer, ignoring ownership.
    pub fn admits(&self, user: &Address) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(user)
    }
}

/// One counter-proposal under a trade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Position in the parent trade's offer sequence.
    pub index: u32,
    /// Parent trade address.
    pub trade: Address,
    /// Proposer.
    pub user: Address,
    /// Offer-scope asset counters.
    pub assets: AssetCounters,
    /// Offer-scope items already settled.
    pub settled_count: u32,
}

impl Offer {
    /// A fresh offer with every counter at zero.
    pub fn new(index: u32, trade: Address, user: Address) -> Self {
        Self {
            index,
            trade,
            user,
            assets: AssetCounters::default(),
            settled_count: 0,
        }
    }
}

/// One escrowed asset.
///
/// The record is never deleted or moved between scopes. Settlement only
/// reassigns custody of the underlying value and sets `settled_to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItem {
    /// Side it was escrowed under.
    pub scope: Scope,
    /// Trade or offer address it was added to.
    pub parent: Address,
    /// Position inside the parent.
    pub slot: AssetSlot,
    /// Who escrowed it.
    pub depositor: Address,
    /// Variant-specific payload.
    pub payload: AssetPayload,
    /// Recipient once settled.
    pub settled_to: Option<Address>,
}

impl AssetItem {
    /// Asset kind of the payload.
    pub fn kind(&self) -> AssetKind {
        self.payload.kind()
    }

    /// Whether custody has been reassigned.
    pub fn is_settled(&self) -> bool {
        self.settled_to.is_some()
    }

    /// The payload in its binary envelope.
    pub fn envelope(&self) -> Result<AssetEnvelope, CodecError> {
        encode(&self.payload)
    }
}

/// Any record the ledger stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// Authority singleton.
    Authority(Authority),
    /// Trade.
    Trade(Trade),
    /// Offer.
    Offer(Offer),
    /// Asset item.
    AssetItem(AssetItem),
}

impl Record {
    /// Short type name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Authority(_) => "authority",
            Record::Trade(_) => "trade",
            Record::Offer(_) => "offer",
            Record::AssetItem(_) => "asset_item",
        }
    }
}

impl From<Authority> for Record {
    fn from(value: Authority) -> Self {
        Record::Authority(value)
    }
}

impl From<Trade> for Record {
    fn from(value: Trade) -> Self {
        Record::Trade(value)
    }
}

impl From<Offer> for Record {
    fn from(value: Offer) -> Self {
        Record::Offer(value)
    }
}

impl From<AssetItem> for Record {
    fn from(value: AssetItem) -> Self {
        Record::AssetItem(value)
    }
}

/// A record together with the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Stored value.
    pub value: T,
    /// Bumped on every write; 1 after create.
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Wrap a value read at `version`.
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }

    /// Apply `f` to the value, keeping the version.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Option<U>) -> Option<Versioned<U>> {
        let version = self.version;
        f(self.value).map(|value| Versioned { value, version })
    }
}
