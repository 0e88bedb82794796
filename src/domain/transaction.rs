//! Transaction records
//!
//! Immutable log entries, one per affected account for every balance change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Amount;

/// Display format for transaction timestamps
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of balance change a transaction records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TransactionKind {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::TransferOut => "TRANSFER_OUT",
            Self::TransferIn => "TRANSFER_IN",
        }
    }

    /// Whether this kind adds to the balance
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit | Self::TransferIn)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            "TRANSFER_OUT" => Ok(Self::TransferOut),
            "TRANSFER_IN" => Ok(Self::TransferIn),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// A recorded balance change on one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new record stamped with the current time
    pub fn new(
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Timestamp formatted for display (UTC)
    pub fn display_timestamp(&self) -> String {
        self.created_at.format(DISPLAY_FORMAT).to_string()
    }
}
