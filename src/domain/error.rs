//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business rule violations raised by the account service.
///
/// These are user-input-driven failures; none of them is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// No account with this username (or id)
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Username is already registered
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// Balance does not cover the requested debit
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// Zero, negative, malformed or out-of-range amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Source and destination of a transfer are the same account
    #[error("Cannot transfer to the same account")]
    SelfTransfer,
}

impl DomainError {
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    pub fn account_not_found(key: impl Into<String>) -> Self {
        Self::AccountNotFound(key.into())
    }

    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "account_not_found",
            Self::DuplicateUsername(_) => "duplicate_username",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::SelfTransfer => "self_transfer",
        }
    }
}
