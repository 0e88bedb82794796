//! Account
//!
//! Account state plus the balance rules. Rule methods never mutate the
//! account; they return a `Posting` that the service hands to the store.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use super::{Amount, Balance, DomainError, Transaction, TransactionKind};

/// A registered account
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    id: Uuid,
    username: String,
    password_hash: String,
    balance: Balance,
    /// Number of committed balance changes, used as a concurrency token
    version: i64,
    created_at: DateTime<Utc>,
}

// Keeps the credential hash out of logs
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("balance", &self.balance)
            .field("version", &self.version)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// An account that has not been persisted yet
#[derive(Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// The stored account right after registration
    pub fn into_account(self) -> Account {
        Account {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            balance: Balance::zero(),
            version: 0,
            created_at: self.created_at,
        }
    }
}

/// A computed balance change: the new balance for one account and the
/// transaction that records it. Only valid against `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account_id: Uuid,
    pub expected_version: i64,
    pub balance: Balance,
    pub transaction: Transaction,
}

impl Account {
    /// Rebuild an account from stored state
    pub(crate) fn from_parts(
        id: Uuid,
        username: String,
        password_hash: String,
        balance: Balance,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            balance,
            version,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn deposit(&self, amount: &Amount) -> Result<Posting, DomainError> {
        let balance = self.balance.credit(amount)?;
        Ok(self.posting(balance, TransactionKind::Deposit, amount, "Deposit"))
    }

    pub fn withdraw(&self, amount: &Amount) -> Result<Posting, DomainError> {
        let balance = self.balance.debit(amount)?;
        Ok(self.posting(balance, TransactionKind::Withdrawal, amount, "Withdrawal"))
    }

    /// Debit side of a transfer to `recipient`
    pub fn transfer_out(&self, amount: &Amount, recipient: &str) -> Result<Posting, DomainError> {
        let balance = self.balance.debit(amount)?;
        Ok(self.posting(
            balance,
            TransactionKind::TransferOut,
            amount,
            format!("Transfer to {}", recipient),
        ))
    }

    /// Credit side of a transfer from `sender`
    pub fn transfer_in(&self, amount: &Amount, sender: &str) -> Result<Posting, DomainError> {
        let balance = self.balance.credit(amount)?;
        Ok(self.posting(
            balance,
            TransactionKind::TransferIn,
            amount,
            format!("Transfer from {}", sender),
        ))
    }

    /// State after a committed posting
    pub(crate) fn apply(&self, posting: &Posting) -> Self {
        Self {
            balance: posting.balance,
            version: self.version + 1,
            ..self.clone()
        }
    }

    fn posting(
        &self,
        balance: Balance,
        kind: TransactionKind,
        amount: &Amount,
        description: impl Into<String>,
    ) -> Posting {
        Posting {
            account_id: self.id,
            expected_version: self.version,
            balance,
            transaction: Transaction::new(self.id, kind, *amount, description),
        }
    }
}
