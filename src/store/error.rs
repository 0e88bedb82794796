//! Store Errors
//!
//! Error types for account and transaction persistence.

use uuid::Uuid;

/// Errors that can occur in a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for account {account_id}: expected version {expected}")]
    ConcurrencyConflict { account_id: Uuid, expected: i64 },

    /// Unique constraint violated (e.g. username taken)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A posting referenced an account that does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed domain validation
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }

    /// Map a database error, surfacing unique violations explicitly
    pub(crate) fn from_database(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(
                    db_err.constraint().unwrap_or("unique").to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}
