//! Domain module
//!
//! Core domain types and balance rules.

pub mod account;
pub mod amount;
pub mod error;
pub mod transaction;

pub use account::{Account, NewAccount, Posting};
pub use amount::{Amount, AmountError, Balance};
pub use error::DomainError;
pub use transaction::{Transaction, TransactionKind};
