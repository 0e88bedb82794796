//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Version conflict: concurrent modification detected")]
    VersionConflict,

    // Server errors (5xx)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict { .. } => AppError::VersionConflict,
            StoreError::UniqueViolation(constraint) => AppError::ConstraintViolation(constraint),
            StoreError::AccountNotFound(id) => {
                AppError::Domain(DomainError::account_not_found(id.to_string()))
            }
            StoreError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                AppError::StorageUnavailable(e.to_string())
            }
            StoreError::InvalidData(msg) => AppError::Internal(msg),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Domain(domain_err) => {
                let status = match domain_err {
                    DomainError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                    DomainError::DuplicateUsername(_) => StatusCode::CONFLICT,
                    DomainError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    DomainError::InvalidAmount(_) | DomainError::SelfTransfer => {
                        StatusCode::BAD_REQUEST
                    }
                };
                (status, domain_err.code())
            }
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::ConstraintViolation(_) => (StatusCode::CONFLICT, "constraint_violation"),
            AppError::VersionConflict => (StatusCode::CONFLICT, "version_conflict"),
            AppError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        // Server-side details stay in the logs
        let (error, details) = match &self {
            AppError::Domain(_) => (self.to_string(), None),
            AppError::InvalidRequest(msg) | AppError::ConstraintViolation(msg) => {
                (self.to_string(), Some(msg.clone()))
            }
            AppError::StorageUnavailable(_) => ("Storage unavailable".to_string(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_distinct_codes() {
        let cases = [
            (
                AppError::from(DomainError::account_not_found("bob")),
                StatusCode::NOT_FOUND,
                "account_not_found",
            ),
            (
                AppError::from(DomainError::DuplicateUsername("alice".into())),
                StatusCode::CONFLICT,
                "duplicate_username",
            ),
            (
                AppError::from(DomainError::insufficient_funds(Decimal::TEN, Decimal::ONE)),
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
            ),
            (
                AppError::from(DomainError::InvalidAmount("0".into())),
                StatusCode::BAD_REQUEST,
                "invalid_amount",
            ),
            (
                AppError::from(DomainError::SelfTransfer),
                StatusCode::BAD_REQUEST,
                "self_transfer",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_store_errors_stay_distinct() {
        let conflict = AppError::from(StoreError::ConcurrencyConflict {
            account_id: Uuid::new_v4(),
            expected: 1,
        });
        assert!(matches!(conflict, AppError::VersionConflict));

        let unique = AppError::from(StoreError::UniqueViolation("accounts_username_key".into()));
        assert!(matches!(unique, AppError::ConstraintViolation(_)));

        let io = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(
            io.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
        );
    }
}
