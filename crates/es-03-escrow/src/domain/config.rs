//! # Escrow Configuration
//!
//! ## Environment Variables
//!
//! - `ES_PROGRAM_ID`: base58 program id every address is derived under
//! - `ES_MAX_ALLOWED_USERS`: allow-list cap per trade (default: 5)
//! - `ES_MAX_CONFLICT_RETRIES`: attempts per operation when a concurrent
//!   writer advances a counter first (default: 8)

use super::invariants::DEFAULT_MAX_ALLOWED_USERS;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::env;
use thiserror::Error;

/// Default attempts per operation under write conflicts.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 8;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Program id left at the all-zero default.
    #[error("Program id is the zero address. Set ES_PROGRAM_ID or provide it in config.")]
    ZeroProgramId,

    /// Retry budget of zero would reject every operation.
    #[error("max_conflict_retries must be at least 1")]
    ZeroConflictRetries,
}

/// Escrow service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Program id addresses are derived under.
    pub program_id: Address,
    /// Allow-list cap per trade.
    pub max_allowed_users: usize,
    /// Attempts per operation under write conflicts.
    pub max_conflict_retries: u32,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            program_id: Address::ZERO, // MUST be overridden in production
            max_allowed_users: DEFAULT_MAX_ALLOWED_USERS,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl EscrowConfig {
    /// Defaults with a specific program id.
    pub fn with_program_id(program_id: Address) -> Self {
        Self {
            program_id,
            ..Self::default()
        }
    }

    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("ES_PROGRAM_ID") {
            config.program_id = value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "ES_PROGRAM_ID",
                value,
            })?;
        }
        if let Some(value) = lookup("ES_MAX_ALLOWED_USERS") {
            config.max_allowed_users = value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "ES_MAX_ALLOWED_USERS",
                value,
            })?;
        }
        if let Some(value) = lookup("ES_MAX_CONFLICT_RETRIES") {
            config.max_conflict_retries =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "ES_MAX_CONFLICT_RETRIES",
                    value,
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Structural checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_conflict_retries == 0 {
            return Err(ConfigError::ZeroConflictRetries);
        }
        Ok(())
    }

    /// Reject development defaults.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.program_id.is_zero() {
            return Err(ConfigError::ZeroProgramId);
        }
        Ok(())
    }
}
