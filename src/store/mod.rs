//! Store module
//!
//! Persistence ports for accounts and the transaction log, plus the
//! in-memory and PostgreSQL adapters.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, Posting, Transaction};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Account lookups and registration
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Persist a newly registered account.
    ///
    /// A taken username is reported as `StoreError::UniqueViolation`.
    async fn save(&self, account: NewAccount) -> StoreResult<Account>;
}

/// Read side of the transaction log
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All transactions of one account, most recent first
    async fn find_by_account_id(&self, account_id: Uuid) -> StoreResult<Vec<Transaction>>;
}

/// Both stores behind one transactional boundary.
///
/// `commit` is the only way balances change and transactions get appended.
#[async_trait]
pub trait LedgerStore: AccountStore + TransactionStore {
    /// Atomically write every posting's balance and append its transaction.
    ///
    /// Each posting is checked against the account version it was computed
    /// from; any mismatch fails the whole batch with
    /// `StoreError::ConcurrencyConflict` and nothing is applied.
    async fn commit(&self, postings: Vec<Posting>) -> StoreResult<Vec<Transaction>>;
}

/// Order postings by account id so locks are always taken in the same order
pub(crate) fn lock_order(mut postings: Vec<Posting>) -> Vec<Posting> {
    postings.sort_by_key(|p| p.account_id);
    postings
}
