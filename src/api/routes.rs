//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{Account, DomainError, Transaction, TransactionKind};
use crate::error::AppError;
use crate::service::BankService;

use super::middleware::AuthenticatedUser;

const MAX_USERNAME_LEN: usize = 64;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub to_username: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub balance: Decimal,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            username: account.username().to_string(),
            balance: account.balance().value(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub to_username: String,
    pub amount: Decimal,
    /// Sender's balance after the transfer
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionEntry {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionEntry {
    fn from(tx: Transaction) -> Self {
        Self {
            timestamp: tx.display_timestamp(),
            id: tx.id,
            kind: tx.kind,
            amount: tx.amount.value(),
            description: tx.description,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub username: String,
    pub entries: Vec<TransactionEntry>,
}

// =========================================================================
// Routers
// =========================================================================

/// Routes that need no authentication
pub fn public_router() -> Router<BankService> {
    Router::new().route("/register", post(register))
}

/// Routes for the authenticated caller's own account
pub fn account_router() -> Router<BankService> {
    Router::new()
        .route("/account", get(get_account))
        .route("/account/deposit", post(deposit))
        .route("/account/withdraw", post(withdraw))
        .route("/account/transfer", post(transfer))
        .route("/account/transactions", get(get_history))
}

// =========================================================================
// Validation
// =========================================================================

fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    let username = &request.username;
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Username must be 1 to {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if username.chars().any(|c| c.is_whitespace() || c == ':') {
        return Err(AppError::InvalidRequest(
            "Username must not contain whitespace or ':'".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(AppError::InvalidRequest("Password must not be empty".to_string()));
    }
    Ok(())
}

fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| DomainError::InvalidAmount(format!("{}: {}", raw, e)).into())
}

// =========================================================================
// POST /register
// =========================================================================

async fn register(
    State(service): State<BankService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    validate_registration(&request)?;

    let account = service
        .register_account(&request.username, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

// =========================================================================
// GET /account
// =========================================================================

async fn get_account(
    State(service): State<BankService>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = service.find_account_by_username(&user.username).await?;
    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /account/deposit, POST /account/withdraw
// =========================================================================

async fn deposit(
    State(service): State<BankService>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let account = service.find_account_by_username(&user.username).await?;
    let account = service.deposit(&account, amount).await?;
    Ok(Json(AccountResponse::from(&account)))
}

async fn withdraw(
    State(service): State<BankService>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let account = service.find_account_by_username(&user.username).await?;
    let account = service.withdraw(&account, amount).await?;
    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /account/transfer
// =========================================================================

async fn transfer(
    State(service): State<BankService>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let account = service.find_account_by_username(&user.username).await?;
    let receipt = service
        .transfer_amount(&account, &request.to_username, amount)
        .await?;

    Ok(Json(TransferResponse {
        to_username: receipt.to.username().to_string(),
        amount: receipt.amount.value(),
        balance: receipt.from.balance().value(),
    }))
}

// =========================================================================
// GET /account/transactions
// =========================================================================

async fn get_history(
    State(service): State<BankService>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<HistoryResponse>, AppError> {
    let account = service.find_account_by_username(&user.username).await?;
    let entries = service
        .get_transaction_history(&account)
        .await?
        .into_iter()
        .map(TransactionEntry::from)
        .collect();

    Ok(Json(HistoryResponse {
        username: user.username,
        entries,
    }))
}
