//! bankapp Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod service;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Account, Amount, AmountError, Balance, DomainError, Transaction, TransactionKind};
pub use error::{AppError, AppResult, ErrorResponse};
pub use service::{BankService, TransferReceipt};
