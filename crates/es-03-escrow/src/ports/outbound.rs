//! # Outbound Ports
//!
//! The ledger collaborator: durable records keyed by address, custody of
//! native balances and token accounts, and all-or-nothing conditional
//! commits. There is no atomicity across two commits.

use crate::domain::{LedgerError, Record, Versioned};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::Address;

/// A fungible token account held on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAccount {
    /// Token class.
    pub mint: Address,
    /// Current owner.
    pub owner: Address,
}

/// One conditional write inside a `ChangeSet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerWrite {
    /// Create-if-absent.
    Create {
        /// Record address.
        address: Address,
        /// New record, stored at version 1.
        record: Record,
    },
    /// Update-if-version-matches.
    Update {
        /// Record address.
        address: Address,
        /// Replacement record.
        record: Record,
        /// Version the writer read.
        expected_version: u64,
    },
    /// Read guard: fails unless the record is still at this version.
    AssertVersion {
        /// Record address.
        address: Address,
        /// Version the writer read.
        expected_version: u64,
    },
    /// Move native value.
    TransferNative {
        /// Source.
        from: Address,
        /// Destination.
        to: Address,
        /// Quantity.
        amount: u64,
    },
    /// Hand a token account to a new owner.
    ReassignTokenAccount {
        /// Token account.
        account: Address,
        /// Owner the writer expects now.
        from_owner: Address,
        /// New owner.
        to_owner: Address,
    },
}

/// Ordered writes applied with all-or-nothing effect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    writes: Vec<LedgerWrite>,
}

impl ChangeSet {
    /// Empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a create-if-absent.
    pub fn create(mut self, address: Address, record: impl Into<Record>) -> Self {
        self.writes.push(LedgerWrite::Create {
            address,
            record: record.into(),
        });
        self
    }

    /// Append an update-if-version-matches.
    pub fn update(
        mut self,
        address: Address,
        record: impl Into<Record>,
        expected_version: u64,
    ) -> Self {
        self.writes.push(LedgerWrite::Update {
            address,
            record: record.into(),
            expected_version,
        });
        self
    }

    /// Append a version guard.
    pub fn assert_version(mut self, address: Address, expected_version: u64) -> Self {
        self.writes.push(LedgerWrite::AssertVersion {
            address,
            expected_version,
        });
        self
    }

    /// Append a native transfer.
    pub fn transfer_native(mut self, from: Address, to: Address, amount: u64) -> Self {
        self.writes
            .push(LedgerWrite::TransferNative { from, to, amount });
        self
    }

    /// Append a token account reassignment.
    pub fn reassign_token_account(
        mut self,
        account: Address,
        from_owner: Address,
        to_owner: Address,
    ) -> Self {
        self.writes.push(LedgerWrite::ReassignTokenAccount {
            account,
            from_owner,
            to_owner,
        });
        self
    }

    /// Writes in application order.
    pub fn writes(&self) -> &[LedgerWrite] {
        &self.writes
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl IntoIterator for ChangeSet {
    type Item = LedgerWrite;
    type IntoIter = std::vec::IntoIter<LedgerWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// Ledger - outbound port.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Read a record and its version.
    async fn load(&self, address: &Address) -> Result<Option<Versioned<Record>>, LedgerError>;

    /// Native balance held at `address`; zero if never funded.
    async fn native_balance(&self, address: &Address) -> Result<u64, LedgerError>;

    /// Token account at `address`.
    async fn token_account(&self, address: &Address) -> Result<Option<TokenAccount>, LedgerError>;

    /// Apply every write or none. The first failing write is reported.
    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError>;
}
