//! Common test utilities

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;

use bankapp::api;
use bankapp::auth::PasswordHasher;
use bankapp::store::{LedgerStore, MemoryStore};
use bankapp::BankService;

/// Argon2 parameters cheap enough for tests
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(1024, 1).expect("valid hasher params")
}

/// Service over a fresh in-memory store
pub fn memory_service() -> BankService {
    let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
    BankService::new(store, test_hasher())
}

/// Full application router over a fresh in-memory store
pub fn memory_app() -> Router {
    api::build_router(memory_service())
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Decimal fields are serialized as strings
pub fn decimal_field(json: &Value, field: &str) -> Decimal {
    let raw = json[field]
        .as_str()
        .unwrap_or_else(|| panic!("{} is not a string: {}", field, json));
    Decimal::from_str(raw).unwrap()
}
