//! Service module
//!
//! The account & transaction service that orchestrates the stores.

mod bank_service;
mod locks;


pub use bank_service::{BankService, TransferReceipt};
pub use locks::AccountLocks;
