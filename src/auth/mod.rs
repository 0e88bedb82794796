//! Authentication module
//!
//! Credential contract handed to the login adapter, and password hashing.

mod password;

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::domain::Account;

pub use password::{PasswordError, PasswordHasher};

/// Authorization role. Every account gets the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a login check needs to know about an account
#[derive(Clone)]
pub struct Credentials {
    pub account_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl From<&Account> for Credentials {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id(),
            username: account.username().to_string(),
            password_hash: account.password_hash().to_string(),
            role: Role::User,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
