//! ES-CLI: offline helpers behind the operator binary.
//!
//! Seed argument parsing and JSON report shapes. Nothing here touches a
//! ledger; every command is a pure function of its arguments.

use es_01_address_derivation::{DerivedAddress, SeedSchema, SeedValue, SeedWidth};
use es_02_asset_codec::{AssetEnvelope, AssetPayload};
use serde::Serialize;
use shared_types::Address;
use thiserror::Error;

/// Rejected `--seed` argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedArgError {
    /// No `kind:` prefix.
    #[error("seed '{0}' must look like <kind>:<value>")]
    MissingKind(String),

    /// Prefix is not one of text, u8, u32, addr.
    #[error("unknown seed kind '{0}' (expected text, u8, u32 or addr)")]
    UnknownKind(String),

    /// Value does not parse as the declared kind.
    #[error("bad {kind} seed value '{value}'")]
    BadValue {
        /// Declared kind.
        kind: String,
        /// Raw value.
        value: String,
    },
}

/// Parse `--seed kind:value` arguments into values plus their schema.
///
/// Integers keep their declared width through the schema, so `u8:1` and
/// `u32:1` derive different addresses.
pub fn parse_seed_args(args: &[String]) -> Result<(Vec<SeedValue>, SeedSchema), SeedArgError> {
    let mut values = Vec::with_capacity(args.len());
    let mut schema = SeedSchema::new();

    for (position, arg) in args.iter().enumerate() {
        let (kind, raw) = arg
            .split_once(':')
            .ok_or_else(|| SeedArgError::MissingKind(arg.clone()))?;
        let bad = || SeedArgError::BadValue {
            kind: kind.to_string(),
            value: raw.to_string(),
        };
        let value = match kind {
            "text" => SeedValue::Text(raw.to_string()),
            "u8" => {
                schema = schema.with(position, SeedWidth::U8);
                SeedValue::Int(raw.parse().map_err(|_| bad())?)
            }
            "u32" => {
                schema = schema.with(position, SeedWidth::U32);
                SeedValue::Int(raw.parse().map_err(|_| bad())?)
            }
            "addr" => SeedValue::Address(raw.parse::<Address>().map_err(|_| bad())?),
            other => return Err(SeedArgError::UnknownKind(other.to_string())),
        };
        values.push(value);
    }

    Ok((values, schema))
}

/// A derivation result as printed.
#[derive(Debug, Serialize)]
pub struct DerivationReport {
    /// Program id derived under.
    pub program_id: Address,
    /// What was derived.
    pub record: String,
    /// Derived address.
    pub address: Address,
    /// Bump that produced it.
    pub bump: u8,
}

impl DerivationReport {
    /// Report for one derivation.
    pub fn new(program_id: Address, record: impl Into<String>, derived: DerivedAddress) -> Self {
        Self {
            program_id,
            record: record.into(),
            address: derived.address,
            bump: derived.bump,
        }
    }
}

/// An encoded envelope as printed.
#[derive(Debug, Serialize)]
pub struct EnvelopeReport {
    /// Asset type code.
    pub type_code: u8,
    /// Hex of the encoded body.
    pub body_hex: String,
}

impl From<AssetEnvelope> for EnvelopeReport {
    fn from(envelope: AssetEnvelope) -> Self {
        Self {
            type_code: envelope.type_code,
            body_hex: hex::encode(envelope.body),
        }
    }
}

/// A decoded payload as printed.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadReport {
    /// Native amount.
    Native {
        /// Amount in base units.
        amount: u64,
    },
    /// Token account.
    Token {
        /// Mint.
        mint: Address,
        /// Token account.
        token_account: Address,
    },
}

impl From<AssetPayload> for PayloadReport {
    fn from(payload: AssetPayload) -> Self {
        match payload {
            AssetPayload::Native { amount } => PayloadReport::Native { amount },
            AssetPayload::Token {
                mint,
                token_account,
            } => PayloadReport::Token {
                mint,
                token_account,
            },
        }
    }
}
