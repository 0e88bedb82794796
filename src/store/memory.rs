//! In-memory store
//!
//! All state sits behind a single `RwLock`: commits hold the write lock
//! for the whole batch, readers the read lock, so a reader never observes
//! a balance without its transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, Posting, Transaction};

use super::{lock_order, AccountStore, LedgerStore, StoreError, StoreResult, TransactionStore};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    usernames: HashMap<String, Uuid>,
    /// Insertion order is commit order
    transactions: Vec<Transaction>,
}

/// Process-local store, used by tests and the `memory` backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn save(&self, account: NewAccount) -> StoreResult<Account> {
        let mut state = self.state.write().await;

        if state.usernames.contains_key(&account.username) {
            return Err(StoreError::UniqueViolation(
                "accounts_username_key".to_string(),
            ));
        }

        let account = account.into_account();
        state
            .usernames
            .insert(account.username().to_string(), account.id());
        state.accounts.insert(account.id(), account.clone());

        Ok(account)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_by_account_id(&self, account_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn commit(&self, postings: Vec<Posting>) -> StoreResult<Vec<Transaction>> {
        let postings = lock_order(postings);
        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything
        for posting in &postings {
            let account = state
                .accounts
                .get(&posting.account_id)
                .ok_or(StoreError::AccountNotFound(posting.account_id))?;

            if account.version() != posting.expected_version {
                return Err(StoreError::ConcurrencyConflict {
                    account_id: posting.account_id,
                    expected: posting.expected_version,
                });
            }
        }

        let mut committed = Vec::with_capacity(postings.len());
        for posting in postings {
            if let Some(account) = state.accounts.get_mut(&posting.account_id) {
                *account = account.apply(&posting);
            }
            state.transactions.push(posting.transaction.clone());
            committed.push(posting.transaction);
        }

        Ok(committed)
    }
}
