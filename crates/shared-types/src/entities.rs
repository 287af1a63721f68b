//! # Core Shared Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Address`
//! - **Tags**: `AssetKind`, `Scope`

use crate::errors::AddressError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte public identifier.
///
/// Used for program ids, user wallets, token mints, token accounts and every
/// derived escrow record. The canonical text form is base58.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Byte length of an address.
    pub const LEN: usize = 32;

    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Wrap raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Copy from a slice that must be exactly 32 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Check for the all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// A process-unique address for tests and fixtures.
    ///
    /// Not random and not an on-chain key; two calls never return the same value.
    #[must_use]
    pub fn new_unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_be_bytes());
        bytes[31] = 0xE5;
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// CLUSTER B: TAGS
// =============================================================================

/// The two escrowable asset variants.
///
/// Wire codes: 1 = native value, 2 = fungible token. Code 3 was reserved for
/// compressed NFTs and is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    /// The chain's intrinsic unit of value.
    Native,
    /// A fungible token held in a dedicated token account.
    Token,
}

impl AssetKind {
    /// Both kinds in sub-sequence order.
    pub const ALL: [AssetKind; 2] = [AssetKind::Native, AssetKind::Token];

    /// Wire code of this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            AssetKind::Native => 1,
            AssetKind::Token => 2,
        }
    }

    /// Parse a wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(AssetKind::Native),
            2 => Some(AssetKind::Token),
            _ => None,
        }
    }

    /// Seed literal used when deriving asset item addresses of this kind.
    #[must_use]
    pub const fn seed_literal(self) -> &'static str {
        match self {
            AssetKind::Native => "asset_item_sol",
            AssetKind::Token => "asset_item_spl",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => f.write_str("native"),
            AssetKind::Token => f.write_str("token"),
        }
    }
}

/// Which side of a negotiation an asset item was escrowed under.
///
/// Wire codes (`from_type`): 1 = Trade, 2 = Offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Escrowed by the trade owner.
    Trade,
    /// Escrowed by an offer proposer.
    Offer,
}

impl Scope {
    /// Wire code of this scope.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Scope::Trade => 1,
            Scope::Offer => 2,
        }
    }

    /// Parse a wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Scope::Trade),
            2 => Some(Scope::Offer),
            _ => None,
        }
    }

    /// The opposite side, i.e. where a settled asset of this scope goes.
    #[must_use]
    pub const fn counterparty(self) -> Self {
        match self {
            Scope::Trade => Scope::Offer,
            Scope::Offer => Scope::Trade,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Trade => f.write_str("trade"),
            Scope::Offer => f.write_str("offer"),
        }
    }
}
