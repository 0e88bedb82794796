//! API Middleware
//!
//! HTTP Basic authentication and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::auth::Role;
use crate::domain::DomainError;
use crate::error::AppError;
use crate::service::BankService;

/// The caller, once their password has been checked
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Split an `Authorization: Basic ...` value into username and password
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

// =========================================================================
// Basic authentication
// =========================================================================

/// Verify Basic credentials against the stored hash
pub async fn auth_middleware(
    State(service): State<BankService>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let (username, password) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth)
        .ok_or_else(|| AppError::Unauthorized.into_response())?;

    // Unknown user and wrong password look the same to the caller
    let credentials = match service.load_credentials(&username).await {
        Ok(credentials) => credentials,
        Err(AppError::Domain(DomainError::AccountNotFound(_))) => {
            return Err(AppError::Unauthorized.into_response());
        }
        Err(e) => return Err(e.into_response()),
    };

    let hasher = service.password_hasher().clone();
    let stored_hash = credentials.password_hash.clone();
    let verified =
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()).into_response())?;

    if !verified {
        tracing::info!(username = %credentials.username, "Rejected login");
        return Err(AppError::Unauthorized.into_response());
    }

    request.extensions_mut().insert(AuthenticatedUser {
        account_id: credentials.account_id,
        username: credentials.username,
        role: credentials.role,
    });

    Ok(next.run(request).await)
}

// =========================================================================
// Request logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}
