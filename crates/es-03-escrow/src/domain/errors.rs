//! # Domain Errors
//!
//! Error types for the escrow lifecycle and the ledger it runs against.
//!
//! Every `EscrowError` is terminal for the attempted operation. The only
//! errors the service retries internally are ledger write conflicts, which
//! mean another actor advanced a counter first.

use es_01_address_derivation::DerivationError;
use es_02_asset_codec::CodecError;
use shared_types::Address;
use thiserror::Error;

/// Ledger collaborator error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Create-if-absent found an existing record.
    #[error("Record already exists at {0}")]
    AlreadyExists(Address),

    /// Conditional write against a missing record.
    #[error("Record not found at {0}")]
    NotFound(Address),

    /// Update-if-matches saw a different version.
    #[error("Version conflict at {address}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Record address.
        address: Address,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Native transfer exceeds the source balance.
    #[error("Insufficient funds at {address}: need {needed}, have {available}")]
    InsufficientFunds {
        /// Source address.
        address: Address,
        /// Requested amount.
        needed: u64,
        /// Current balance.
        available: u64,
    },

    /// Token account does not exist.
    #[error("Token account not found: {0}")]
    TokenAccountNotFound(Address),

    /// Token account is not owned by the expected party.
    #[error("Token account {account} owned by {actual}, expected {expected}")]
    TokenOwnerMismatch {
        /// Token account.
        account: Address,
        /// Owner the writer expected.
        expected: Address,
        /// Owner currently recorded.
        actual: Address,
    },

    /// The ledger could not be reached or rejected the request.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether the failure means another writer got there first.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LedgerError::VersionConflict { .. } | LedgerError::AlreadyExists(_)
        )
    }
}

/// Escrow error types.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// The authority singleton already exists.
    #[error("Escrow authority already initialized")]
    AlreadyInitialized,

    /// No authority singleton yet.
    #[error("Escrow authority not initialized")]
    NotInitialized,

    /// No record at the address, or a record of another type.
    #[error("Record not found: {0}")]
    NotFound(Address),

    /// The trade has already accepted an offer.
    #[error("Operation out of sequence: {0}")]
    OutOfSequence(String),

    /// Second accept attempt on a decided trade.
    #[error("Trade {trade} already accepted offer {accepted}")]
    AlreadyDecided {
        /// Trade address.
        trade: Address,
        /// Offer latched at first acceptance.
        accepted: Address,
    },

    /// Caller is not the owner of the record it tried to act on.
    #[error("Not owner: expected {expected}, got {actual}")]
    NotOwner {
        /// Recorded owner.
        expected: Address,
        /// Acting party.
        actual: Address,
    },

    /// Counterparty is not allowed on this trade.
    #[error("Not allowed: {0}")]
    NotAllowed(Address),

    /// Allow-list above the configured limit.
    #[error("Too many allowed users: {count}, limit is {max}")]
    TooManyAllowedUsers {
        /// Supplied entries.
        count: usize,
        /// Configured limit.
        max: usize,
    },

    /// Native amount of zero.
    #[error("Invalid amount: native assets must be greater than zero")]
    InvalidAmount,

    /// Asset payload does not match its declared type code.
    #[error(transparent)]
    MalformedPayload(#[from] CodecError),

    /// Seed tuple could not be derived.
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// Asset item already exchanged.
    #[error("Asset item already settled: {0}")]
    AlreadySettled(Address),

    /// A caller-supplied reference disagrees with recomputed state.
    #[error("Address mismatch on {what}: expected {expected}, got {actual}")]
    AddressMismatch {
        /// What was compared.
        what: &'static str,
        /// Recomputed value.
        expected: String,
        /// Supplied value.
        actual: String,
    },

    /// Settlement named an offer other than the accepted one.
    #[error("Offer {0} was not accepted")]
    OfferNotAccepted(Address),

    /// A wire code outside the known set.
    #[error("Unknown {field} code: {code}")]
    UnknownCode {
        /// Field carrying the code.
        field: &'static str,
        /// Raw code.
        code: u8,
    },

    /// A sequence counter reached its maximum.
    #[error("Counter overflow: {0}")]
    CounterOverflow(&'static str),

    /// Ledger collaborator failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EscrowError {
    pub(crate) fn mismatch(
        what: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        EscrowError::AddressMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether the service may re-read and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EscrowError::Ledger(e) if e.is_conflict())
    }
}

/// Result alias for escrow operations.
pub type EscrowResult<T> = Result<T, EscrowError>;
