//! Account & Transaction Service
//!
//! Registration, deposits, withdrawals, transfers and history. Every
//! balance change goes through `LedgerStore::commit` together with its
//! transaction record.

use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{Credentials, PasswordHasher};
use crate::domain::{Account, Amount, DomainError, NewAccount, Transaction};
use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, StoreError};

use super::locks::AccountLocks;

/// Commit attempts before a version conflict is reported
const MAX_RETRIES: u32 = 3;

/// Both sides of a completed transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
    pub amount: Amount,
}

/// The account service. Cheap to clone; clones share store and locks.
#[derive(Clone)]
pub struct BankService {
    store: Arc<dyn LedgerStore>,
    hasher: PasswordHasher,
    locks: AccountLocks,
}

impl BankService {
    pub fn new(store: Arc<dyn LedgerStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            locks: AccountLocks::new(),
        }
    }

    pub fn password_hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    // =========================================================================
    // Registration & lookup
    // =========================================================================

    /// Register a new account with a zero balance
    pub async fn register_account(&self, username: &str, password: &str) -> AppResult<Account> {
        if self.store.find_by_username(username).await?.is_some() {
            return Err(DomainError::DuplicateUsername(username.to_string()).into());
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // The unique index catches registrations racing past the check above
        let account = match self.store.save(NewAccount::new(username, password_hash)).await {
            Ok(account) => account,
            Err(StoreError::UniqueViolation(_)) => {
                return Err(DomainError::DuplicateUsername(username.to_string()).into());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(account_id = %account.id(), username, "Account registered");
        Ok(account)
    }

    pub async fn find_account_by_username(&self, username: &str) -> AppResult<Account> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::account_not_found(username).into())
    }

    /// Credential lookup for the login adapter
    pub async fn load_credentials(&self, username: &str) -> AppResult<Credentials> {
        let account = self.find_account_by_username(username).await?;
        Ok(Credentials::from(&account))
    }

    // =========================================================================
    // Balance operations
    // =========================================================================

    /// Add `amount` to the account. Returns the updated account.
    pub async fn deposit(&self, account: &Account, amount: Decimal) -> AppResult<Account> {
        let amount = Amount::new(amount).map_err(DomainError::from)?;
        let account_id = account.id();
        let _guards = self.locks.acquire(&[account_id]).await;

        let this = self;
        let updated = with_retry("deposit", move || async move {
            let current = this.reload(account_id).await?;
            let posting = current.deposit(&amount)?;
            this.store.commit(vec![posting.clone()]).await?;
            Ok(current.apply(&posting))
        })
        .await?;

        tracing::info!(
            account_id = %account_id,
            amount = %amount,
            balance = %updated.balance(),
            "Deposit committed"
        );
        Ok(updated)
    }

    /// Take `amount` from the account. Returns the updated account.
    pub async fn withdraw(&self, account: &Account, amount: Decimal) -> AppResult<Account> {
        let amount = Amount::new(amount).map_err(DomainError::from)?;
        let account_id = account.id();
        let _guards = self.locks.acquire(&[account_id]).await;

        let this = self;
        let updated = with_retry("withdraw", move || async move {
            let current = this.reload(account_id).await?;
            let posting = current.withdraw(&amount)?;
            this.store.commit(vec![posting.clone()]).await?;
            Ok(current.apply(&posting))
        })
        .await?;

        tracing::info!(
            account_id = %account_id,
            amount = %amount,
            balance = %updated.balance(),
            "Withdrawal committed"
        );
        Ok(updated)
    }

    /// Move `amount` from `from` to the account named `to_username`.
    ///
    /// Checks run in order: amount, self-transfer, recipient, funds.
    pub async fn transfer_amount(
        &self,
        from: &Account,
        to_username: &str,
        amount: Decimal,
    ) -> AppResult<TransferReceipt> {
        let amount = Amount::new(amount).map_err(DomainError::from)?;

        if to_username == from.username() {
            return Err(DomainError::SelfTransfer.into());
        }

        let recipient = self.find_account_by_username(to_username).await?;
        let (from_id, to_id) = (from.id(), recipient.id());
        if from_id == to_id {
            return Err(DomainError::SelfTransfer.into());
        }

        let _guards = self.locks.acquire(&[from_id, to_id]).await;

        let this = self;
        let receipt = with_retry("transfer", move || async move {
            let sender = this.reload(from_id).await?;
            let recipient = this.reload(to_id).await?;

            let debit = sender.transfer_out(&amount, recipient.username())?;
            let credit = recipient.transfer_in(&amount, sender.username())?;
            this.store.commit(vec![debit.clone(), credit.clone()]).await?;

            Ok(TransferReceipt {
                from: sender.apply(&debit),
                to: recipient.apply(&credit),
                amount,
            })
        })
        .await?;

        tracing::info!(
            from_account_id = %from_id,
            to_account_id = %to_id,
            amount = %amount,
            "Transfer committed"
        );
        Ok(receipt)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// All transactions of the account, most recent first
    pub async fn get_transaction_history(&self, account: &Account) -> AppResult<Vec<Transaction>> {
        Ok(self.store.find_by_account_id(account.id()).await?)
    }

    async fn reload(&self, id: Uuid) -> AppResult<Account> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(id.to_string()).into())
    }
}

/// Run `attempt` until it stops failing with a version conflict
async fn with_retry<T, F, Fut>(operation: &'static str, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    for n in 1..=MAX_RETRIES {
        match attempt().await {
            Err(AppError::VersionConflict) if n < MAX_RETRIES => {
                tracing::warn!(
                    operation,
                    "Concurrency conflict, retrying (attempt {}/{})",
                    n,
                    MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_millis(50 * n as u64)).await;
            }
            result => return result,
        }
    }

    Err(AppError::VersionConflict)
}
