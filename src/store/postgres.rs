//! PostgreSQL store
//!
//! Accounts and transactions live in two tables. `commit` writes all
//! postings inside one database transaction, guarding every balance update
//! with the expected version.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use uuid::Uuid;

use crate::domain::{
    Account, Amount, Balance, NewAccount, Posting, Transaction, TransactionKind,
};

use super::{lock_order, AccountStore, LedgerStore, StoreError, StoreResult, TransactionStore};

type AccountRow = (Uuid, String, String, Decimal, i64, DateTime<Utc>);
type TransactionRow = (Uuid, Uuid, String, Decimal, String, DateTime<Utc>);

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn update_balance(
        tx: &mut PgTransaction<'_, Postgres>,
        posting: &Posting,
    ) -> StoreResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, version = version + 1
            WHERE id = $1 AND version = $3
            "#,
        )
        .bind(posting.account_id)
        .bind(posting.balance.value())
        .bind(posting.expected_version)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::from_database)?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::ConcurrencyConflict {
                account_id: posting.account_id,
                expected: posting.expected_version,
            });
        }

        Ok(())
    }

    async fn insert_transaction(
        tx: &mut PgTransaction<'_, Postgres>,
        record: &Transaction,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, kind, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(record.account_id)
        .bind(record.kind.as_str())
        .bind(record.amount.value())
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::from_database)?;

        Ok(())
    }
}

fn account_from_row(row: AccountRow) -> StoreResult<Account> {
    let (id, username, password_hash, balance, version, created_at) = row;
    let balance = Balance::new(balance)
        .map_err(|e| StoreError::InvalidData(format!("account {}: {}", id, e)))?;
    Ok(Account::from_parts(
        id,
        username,
        password_hash,
        balance,
        version,
        created_at,
    ))
}

fn transaction_from_row(row: TransactionRow) -> StoreResult<Transaction> {
    let (id, account_id, kind, amount, description, created_at) = row;
    let kind = kind
        .parse::<TransactionKind>()
        .map_err(StoreError::InvalidData)?;
    let amount = Amount::new(amount)
        .map_err(|e| StoreError::InvalidData(format!("transaction {}: {}", id, e)))?;
    Ok(Transaction {
        id,
        account_id,
        kind,
        amount,
        description,
        created_at,
    })
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, balance, version, created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, balance, version, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn save(&self, account: NewAccount) -> StoreResult<Account> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, balance, version, created_at)
            VALUES ($1, $2, $3, 0, 0, $4)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_database)?;

        Ok(account.into_account())
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn find_by_account_id(&self, account_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, kind, amount, description, created_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn commit(&self, postings: Vec<Posting>) -> StoreResult<Vec<Transaction>> {
        let postings = lock_order(postings);
        let mut tx = self.pool.begin().await?;

        // Dropping `tx` on an early return rolls everything back
        for posting in &postings {
            Self::update_balance(&mut tx, posting).await?;
        }
        for posting in &postings {
            Self::insert_transaction(&mut tx, &posting.transaction).await?;
        }

        tx.commit().await?;

        tracing::debug!(postings = postings.len(), "Ledger batch committed");

        Ok(postings.into_iter().map(|p| p.transaction).collect())
    }
}
