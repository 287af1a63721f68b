//! # Seed Model
//!
//! Typed seed values and their positional byte encoding.
//!
//! Two ways to build a seed tuple:
//!
//! - **Typed**: a `Vec<Seed>` where every integer already carries its width.
//! - **Schema-driven**: loosely typed `SeedValue`s plus a `SeedSchema`
//!   declaring the width of each integer position. Width is never inferred
//!   from the value, so `1` as `u8` and `1` as `u32` stay distinct.

use super::errors::DerivationError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of seeds in one derivation, bump included.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Domain separator appended after the program id.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Seed literal of the authority singleton.
pub const AUTHORITY_SEED: &str = "authority";

/// Seed literal of trade records.
pub const TRADE_SEED: &str = "trade";

/// Seed literal of offer records.
pub const OFFER_SEED: &str = "offer";

/// One positional seed with a fixed encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seed {
    /// Raw UTF-8 bytes.
    Text(String),
    /// One byte.
    U8(u8),
    /// Four bytes, little-endian.
    U32(u32),
    /// The 32 raw address bytes.
    Address(Address),
}

impl Seed {
    /// Build a text seed.
    pub fn text(value: impl Into<String>) -> Self {
        Seed::Text(value.into())
    }

    /// Encode this seed as it enters the hash.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Seed::Text(s) => s.as_bytes().to_vec(),
            Seed::U8(v) => vec![*v],
            Seed::U32(v) => v.to_le_bytes().to_vec(),
            Seed::Address(a) => a.as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Text(s) => write!(f, "\"{s}\""),
            Seed::U8(v) => write!(f, "{v}u8"),
            Seed::U32(v) => write!(f, "{v}u32"),
            Seed::Address(a) => write!(f, "{a}"),
        }
    }
}

/// A loosely typed seed value, as a client SDK would hand it over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedValue {
    /// A string.
    Text(String),
    /// An integer whose width comes from the schema.
    Int(u64),
    /// A public identifier.
    Address(Address),
}

/// Declared integer width for one seed position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedWidth {
    /// 8-bit.
    U8,
    /// 32-bit little-endian.
    U32,
}

impl SeedWidth {
    fn max(self) -> u64 {
        match self {
            SeedWidth::U8 => u64::from(u8::MAX),
            SeedWidth::U32 => u64::from(u32::MAX),
        }
    }
}

/// Per-position integer widths for a schema-driven seed tuple.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSchema {
    widths: BTreeMap<usize, SeedWidth>,
}

impl SeedSchema {
    /// Empty schema: only text and address seeds are accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the width of the integer at `position`.
    pub fn with(mut self, position: usize, width: SeedWidth) -> Self {
        self.widths.insert(position, width);
        self
    }

    /// Width declared at `position`, if any.
    pub fn width_at(&self, position: usize) -> Option<SeedWidth> {
        self.widths.get(&position).copied()
    }

    /// Resolve loosely typed values into typed seeds.
    ///
    /// Fails with `UnknownDerivationSeed` when an integer has no width, when a
    /// width is declared on a non-integer or past the end of the tuple, or when
    /// an integer does not fit its width.
    pub fn resolve(&self, values: &[SeedValue]) -> Result<Vec<Seed>, DerivationError> {
        if let Some((&position, _)) = self.widths.range(values.len()..).next() {
            return Err(unknown(position, "width declared without a value"));
        }

        values
            .iter()
            .enumerate()
            .map(|(position, value)| match (value, self.width_at(position)) {
                (SeedValue::Text(s), None) => Ok(Seed::Text(s.clone())),
                (SeedValue::Address(a), None) => Ok(Seed::Address(*a)),
                (SeedValue::Int(_), None) => {
                    Err(unknown(position, "integer without declared width"))
                }
                (SeedValue::Int(v), Some(width)) if *v > width.max() => Err(unknown(
                    position,
                    &format!("{v} does not fit {width:?}"),
                )),
                (SeedValue::Int(v), Some(SeedWidth::U8)) => Ok(Seed::U8(*v as u8)),
                (SeedValue::Int(v), Some(SeedWidth::U32)) => Ok(Seed::U32(*v as u32)),
                (_, Some(width)) => Err(unknown(
                    position,
                    &format!("{width:?} width declared on a non-integer"),
                )),
            })
            .collect()
    }
}

fn unknown(position: usize, reason: &str) -> DerivationError {
    DerivationError::UnknownDerivationSeed {
        position,
        reason: reason.to_string(),
    }
}

/// A derived address together with the bump that made it off-curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedAddress {
    /// The derived address.
    pub address: Address,
    /// The disambiguating nonce.
    pub bump: u8,
}
