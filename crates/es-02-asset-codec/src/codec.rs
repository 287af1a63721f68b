//! # Asset Envelope Codec
//!
//! Layout is chosen by the type code alone:
//!
//! | Code | Kind | Body |
//! |------|------|------|
//! | 1 | Native | `u64` amount, little-endian (8 bytes) |
//! | 2 | Token | `u32` len + mint text, `u32` len + token account text |
//! | 3 | reserved | compressed NFTs, unsupported |

use crate::errors::CodecError;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use shared_types::{Address, AssetKind};

/// Type code once reserved for compressed NFTs.
pub const RESERVED_CNFT_CODE: u8 = 3;

/// Body length of a native envelope.
pub const NATIVE_BODY_LEN: usize = 8;

/// Variant-specific payload of an asset item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetPayload {
    /// Native value.
    Native {
        /// Quantity escrowed.
        amount: u64,
    },
    /// Fungible token held in an escrow token account.
    Token {
        /// Token class.
        mint: Address,
        /// Account holding the tokens.
        token_account: Address,
    },
}

impl AssetPayload {
    /// Asset kind of this payload.
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetPayload::Native { .. } => AssetKind::Native,
            AssetPayload::Token { .. } => AssetKind::Token,
        }
    }
}

/// An encoded payload tagged with its type code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEnvelope {
    /// Asset type code.
    pub type_code: u8,
    /// Encoded body.
    pub body: Vec<u8>,
}

impl AssetEnvelope {
    /// Decode the body according to the type code.
    pub fn decode(&self) -> Result<AssetPayload, CodecError> {
        decode(self.type_code, &self.body)
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct NativeWire {
    amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct TokenWire {
    mint: String,
    token_account: String,
}

/// Encode a payload into its envelope.
pub fn encode(payload: &AssetPayload) -> Result<AssetEnvelope, CodecError> {
    let body = match payload {
        AssetPayload::Native { amount } => borsh::to_vec(&NativeWire { amount: *amount }),
        AssetPayload::Token {
            mint,
            token_account,
        } => borsh::to_vec(&TokenWire {
            mint: mint.to_string(),
            token_account: token_account.to_string(),
        }),
    }
    .map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(AssetEnvelope {
        type_code: payload.kind().code(),
        body,
    })
}

/// Decode a body declared as `type_code`.
pub fn decode(type_code: u8, body: &[u8]) -> Result<AssetPayload, CodecError> {
    let kind = AssetKind::from_code(type_code).ok_or_else(|| {
        if type_code == RESERVED_CNFT_CODE {
            CodecError::malformed(type_code, "compressed NFT assets are not supported")
        } else {
            CodecError::malformed(type_code, "unknown asset type code")
        }
    })?;

    match kind {
        AssetKind::Native => {
            if body.len() != NATIVE_BODY_LEN {
                return Err(CodecError::malformed(
                    type_code,
                    format!("expected {NATIVE_BODY_LEN} bytes, got {}", body.len()),
                ));
            }
            let wire: NativeWire =
                borsh::from_slice(body).map_err(|e| CodecError::malformed(type_code, e.to_string()))?;
            Ok(AssetPayload::Native {
                amount: wire.amount,
            })
        }
        AssetKind::Token => {
            let wire: TokenWire =
                borsh::from_slice(body).map_err(|e| CodecError::malformed(type_code, e.to_string()))?;
            let mint = wire
                .mint
                .parse()
                .map_err(|e| CodecError::malformed(type_code, format!("mint: {e}")))?;
            let token_account = wire
                .token_account
                .parse()
                .map_err(|e| CodecError::malformed(type_code, format!("token account: {e}")))?;
            Ok(AssetPayload::Token {
                mint,
                token_account,
            })
        }
    }
}
