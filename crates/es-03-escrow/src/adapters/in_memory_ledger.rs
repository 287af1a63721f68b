//! In-Memory Ledger Adapter
//!
//! Implements the `Ledger` port over process memory. A commit applies its
//! writes in place under the write lock, logging the prior value of every
//! key it touches, and replays that log backwards if any write fails.

use crate::domain::{LedgerError, Record, Versioned};
use crate::ports::outbound::{ChangeSet, Ledger, LedgerWrite, TokenAccount};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::Address;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// Prior value of one key touched by an in-flight commit.
#[derive(Debug)]
enum Undo {
    Record(Address, Option<Versioned<Record>>),
    Balance(Address, Option<u64>),
    TokenAccount(Address, TokenAccount),
}

#[derive(Debug, Default)]
struct LedgerState {
    records: HashMap<Address, Versioned<Record>>,
    balances: HashMap<Address, u64>,
    token_accounts: HashMap<Address, TokenAccount>,
}

impl LedgerState {
    /// Apply every write or none of them.
    fn apply_all(&mut self, changes: ChangeSet) -> Result<(), LedgerError> {
        let mut undo = Vec::with_capacity(changes.len());
        for write in changes {
            if let Err(error) = self.apply(write, &mut undo) {
                self.rollback(undo);
                return Err(error);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Record(address, Some(prior)) => {
                    self.records.insert(address, prior);
                }
                Undo::Record(address, None) => {
                    self.records.remove(&address);
                }
                Undo::Balance(address, Some(prior)) => {
                    self.balances.insert(address, prior);
                }
                Undo::Balance(address, None) => {
                    self.balances.remove(&address);
                }
                Undo::TokenAccount(address, prior) => {
                    self.token_accounts.insert(address, prior);
                }
            }
        }
    }

    /// Apply one write. Checks run before any mutation, and every mutated
    /// key is logged to `undo` first.
    fn apply(&mut self, write: LedgerWrite, undo: &mut Vec<Undo>) -> Result<(), LedgerError> {
        match write {
            LedgerWrite::Create { address, record } => {
                if self.records.contains_key(&address) {
                    return Err(LedgerError::AlreadyExists(address));
                }
                undo.push(Undo::Record(address, None));
                self.records.insert(address, Versioned::new(record, 1));
            }
            LedgerWrite::Update {
                address,
                record,
                expected_version,
            } => {
                let stored = self
                    .records
                    .get_mut(&address)
                    .ok_or(LedgerError::NotFound(address))?;
                check_version(&address, stored.version, expected_version)?;
                let prior = std::mem::replace(
                    stored,
                    Versioned::new(record, expected_version + 1),
                );
                undo.push(Undo::Record(address, Some(prior)));
            }
            LedgerWrite::AssertVersion {
                address,
                expected_version,
            } => {
                let stored = self
                    .records
                    .get(&address)
                    .ok_or(LedgerError::NotFound(address))?;
                check_version(&address, stored.version, expected_version)?;
            }
            LedgerWrite::TransferNative { from, to, amount } => {
                let available = self.balances.get(&from).copied().unwrap_or(0);
                if available < amount {
                    return Err(LedgerError::InsufficientFunds {
                        address: from,
                        needed: amount,
                        available,
                    });
                }
                let prior_to = self.balances.get(&to).copied();
                let credited = if from == to {
                    available
                } else {
                    prior_to
                        .unwrap_or(0)
                        .checked_add(amount)
                        .ok_or_else(|| {
                            LedgerError::Unavailable(format!("balance overflow at {to}"))
                        })?
                };
                undo.push(Undo::Balance(from, self.balances.get(&from).copied()));
                undo.push(Undo::Balance(to, prior_to));
                self.balances.insert(from, available - amount);
                self.balances.insert(to, credited);
            }
            LedgerWrite::ReassignTokenAccount {
                account,
                from_owner,
                to_owner,
            } => {
                let token = self
                    .token_accounts
                    .get_mut(&account)
                    .ok_or(LedgerError::TokenAccountNotFound(account))?;
                if token.owner != from_owner {
                    return Err(LedgerError::TokenOwnerMismatch {
                        account,
                        expected: from_owner,
                        actual: token.owner,
                    });
                }
                undo.push(Undo::TokenAccount(account, *token));
                token.owner = to_owner;
            }
        }
        Ok(())
    }
}

fn check_version(address: &Address, actual: u64, expected: u64) -> Result<(), LedgerError> {
    if actual != expected {
        return Err(LedgerError::VersionConflict {
            address: *address,
            expected,
            actual,
        });
    }
    Ok(())
}

/// In-memory ledger for tests and local tooling.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    /// Errors to return from the next commits, oldest first.
    injected: Mutex<VecDeque<LedgerError>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native value to `address`.
    pub fn fund(&self, address: Address, amount: u64) {
        let mut state = self.state.write();
        let balance = state.balances.entry(address).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Open a token account of `mint` owned by `owner`.
    pub fn open_token_account(&self, account: Address, mint: Address, owner: Address) {
        self.state
            .write()
            .token_accounts
            .insert(account, TokenAccount { mint, owner });
    }

    /// Make the next commit fail with `error` without applying anything.
    pub fn fail_next_commit(&self, error: LedgerError) {
        self.injected.lock().push_back(error);
    }

    /// Number of stored records.
    pub fn record_count(&self) -> usize {
        self.state.read().records.len()
    }

    /// Sum of every native balance.
    pub fn total_native(&self) -> u128 {
        self.state
            .read()
            .balances
            .values()
            .map(|v| u128::from(*v))
            .sum()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn load(&self, address: &Address) -> Result<Option<Versioned<Record>>, LedgerError> {
        Ok(self.state.read().records.get(address).cloned())
    }

    async fn native_balance(&self, address: &Address) -> Result<u64, LedgerError> {
        Ok(self.state.read().balances.get(address).copied().unwrap_or(0))
    }

    async fn token_account(&self, address: &Address) -> Result<Option<TokenAccount>, LedgerError> {
        Ok(self.state.read().token_accounts.get(address).copied())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        if let Some(error) = self.injected.lock().pop_front() {
            debug!("[es-03] Injected ledger failure: {}", error);
            return Err(error);
        }

        let writes = changes.len();
        self.state.write().apply_all(changes)?;
        trace!("[es-03] Committed {} ledger writes", writes);
        Ok(())
    }
}
