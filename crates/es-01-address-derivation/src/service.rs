//! # Address Deriver
//!
//! Binds a program id to the escrow seed tuples.
//!
//! | Record | Seeds |
//! |--------|-------|
//! | Authority | `"authority"`, program id |
//! | Trade | `"trade"`, u32 index |
//! | Offer | trade address, `"offer"`, u32 index |
//! | Asset item | parent address, `"asset_item_sol"`/`"asset_item_spl"`, u32 type index |
//!
//! These tuples are the wire format: any client holding the program id can
//! locate or pre-compute a record before it exists.

use crate::algorithms::find_program_address;
use crate::domain::{
    DerivationError, DerivedAddress, Seed, SeedSchema, SeedValue, AUTHORITY_SEED, OFFER_SEED,
    TRADE_SEED,
};
use serde::{Deserialize, Serialize};
use shared_types::{Address, AssetKind};
use tracing::debug;

/// One asset item address in enumeration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetItemAddress {
    /// Asset kind of the item.
    pub kind: AssetKind,
    /// Position in the parent's kind-specific sub-sequence.
    pub type_index: u32,
    /// Derived location.
    pub derived: DerivedAddress,
}

/// Deterministic address derivation for one deployed program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDeriver {
    program_id: Address,
}

impl AddressDeriver {
    /// Create a deriver for `program_id`.
    pub const fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    /// The program id every address is derived under.
    pub const fn program_id(&self) -> &Address {
        &self.program_id
    }

    /// Derive from a typed seed tuple.
    pub fn derive(&self, seeds: &[Seed]) -> Result<DerivedAddress, DerivationError> {
        let encoded: Vec<Vec<u8>> = seeds.iter().map(Seed::to_bytes).collect();
        let refs: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
        let derived = find_program_address(&refs, &self.program_id)?;
        debug!(
            "[es-01] Derived {} (bump {}) from {} seeds",
            derived.address,
            derived.bump,
            seeds.len()
        );
        Ok(derived)
    }

    /// Derive from loosely typed values and a width schema.
    pub fn derive_with_schema(
        &self,
        values: &[SeedValue],
        schema: &SeedSchema,
    ) -> Result<DerivedAddress, DerivationError> {
        let seeds = schema.resolve(values)?;
        self.derive(&seeds)
    }

    /// The authority singleton.
    pub fn authority(&self) -> Result<DerivedAddress, DerivationError> {
        self.derive(&[Seed::text(AUTHORITY_SEED), Seed::Address(self.program_id)])
    }

    /// The trade at global `index`.
    pub fn trade(&self, index: u32) -> Result<DerivedAddress, DerivationError> {
        self.derive(&[Seed::text(TRADE_SEED), Seed::U32(index)])
    }

    /// The offer at `index` within `trade`.
    pub fn offer(&self, trade: &Address, index: u32) -> Result<DerivedAddress, DerivationError> {
        self.derive(&[Seed::Address(*trade), Seed::text(OFFER_SEED), Seed::U32(index)])
    }

    /// The asset item at `type_index` in the `kind` sub-sequence of `parent`.
    pub fn asset_item(
        &self,
        parent: &Address,
        kind: AssetKind,
        type_index: u32,
    ) -> Result<DerivedAddress, DerivationError> {
        self.derive(&[
            Seed::Address(*parent),
            Seed::text(kind.seed_literal()),
            Seed::U32(type_index),
        ])
    }

    /// Every offer address of `trade`, given its `offer_count`.
    pub fn offers_of(
        &self,
        trade: &Address,
        offer_count: u32,
    ) -> Result<Vec<DerivedAddress>, DerivationError> {
        (0..offer_count).map(|i| self.offer(trade, i)).collect()
    }

    /// Every asset item address of `parent`, natives first, given its kind counters.
    pub fn asset_items_of(
        &self,
        parent: &Address,
        native_count: u32,
        token_count: u32,
    ) -> Result<Vec<AssetItemAddress>, DerivationError> {
        let natives = (0..native_count).map(|i| (AssetKind::Native, i));
        let tokens = (0..token_count).map(|i| (AssetKind::Token, i));
        natives
            .chain(tokens)
            .map(|(kind, type_index)| {
                Ok(AssetItemAddress {
                    kind,
                    type_index,
                    derived: self.asset_item(parent, kind, type_index)?,
                })
            })
            .collect()
    }
}
