//! API integration tests against the in-memory backend

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use tower::util::ServiceExt;

mod common;

use common::{basic_auth, body_json, decimal_field, get_request, json_request, memory_app};

async fn register(app: &axum::Router, username: &str, password: &str) -> StatusCode {
    let req = json_request(
        "POST",
        "/api/v1/register",
        None,
        json!({ "username": username, "password": password }),
    );
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn test_health_check() {
    let app = memory_app();
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_returns_zero_balance() {
    let app = memory_app();
    let req = json_request(
        "POST",
        "/api/v1/register",
        None,
        json!({ "username": "alice", "password": "pw1" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(decimal_field(&json, "balance"), Decimal::ZERO);
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let app = memory_app();
    assert_eq!(register(&app, "alice", "pw1").await, StatusCode::CREATED);

    let req = json_request(
        "POST",
        "/api/v1/register",
        None,
        json!({ "username": "alice", "password": "other" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "duplicate_username");
}

#[tokio::test]
async fn test_register_rejects_bad_username() {
    let app = memory_app();
    assert_eq!(register(&app, "", "pw1").await, StatusCode::BAD_REQUEST);
    assert_eq!(register(&app, "al:ice", "pw1").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_account_requires_credentials() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = basic_auth("alice", "nope");
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account", Some(&wrong)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let unknown = basic_auth("mallory", "pw1");
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account", Some(&unknown)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "unauthorized");
}

#[tokio::test]
async fn test_deposit_and_withdraw() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;
    let auth = basic_auth("alice", "pw1");

    let req = json_request(
        "POST",
        "/api/v1/account/deposit",
        Some(&auth),
        json!({ "amount": "100.00" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(decimal_field(&json, "balance"), Decimal::new(10000, 2));

    let req = json_request(
        "POST",
        "/api/v1/account/withdraw",
        Some(&auth),
        json!({ "amount": "40" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(decimal_field(&json, "balance"), Decimal::new(60, 0));

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account", Some(&auth)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(decimal_field(&json, "balance"), Decimal::new(60, 0));
}

#[tokio::test]
async fn test_withdraw_insufficient_funds() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;
    let auth = basic_auth("alice", "pw1");

    let req = json_request(
        "POST",
        "/api/v1/account/withdraw",
        Some(&auth),
        json!({ "amount": "0.01" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "insufficient_funds");

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account/transactions", Some(&auth)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_amounts_rejected() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;
    let auth = basic_auth("alice", "pw1");

    for amount in ["0", "-5", "abc", "0.000000001"] {
        let req = json_request(
            "POST",
            "/api/v1/account/deposit",
            Some(&auth),
            json!({ "amount": amount }),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "amount {}", amount);
        let json = body_json(response).await;
        assert_eq!(json["error_code"], "invalid_amount");
    }
}

#[tokio::test]
async fn test_transfer_e2e() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;
    register(&app, "bob", "pw2").await;
    let alice = basic_auth("alice", "pw1");
    let bob = basic_auth("bob", "pw2");

    let req = json_request(
        "POST",
        "/api/v1/account/deposit",
        Some(&alice),
        json!({ "amount": "100" }),
    );
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);

    let req = json_request(
        "POST",
        "/api/v1/account/transfer",
        Some(&alice),
        json!({ "to_username": "bob", "amount": "30" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "Transfer failed");
    let json = body_json(response).await;
    assert_eq!(json["to_username"], "bob");
    assert_eq!(decimal_field(&json, "amount"), Decimal::new(30, 0));
    assert_eq!(decimal_field(&json, "balance"), Decimal::new(70, 0));

    // Bob sees the incoming transfer
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account", Some(&bob)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(decimal_field(&json, "balance"), Decimal::new(30, 0));

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account/transactions", Some(&bob)))
        .await
        .unwrap();
    let json = body_json(response).await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["kind"], "TRANSFER_IN");
    assert_eq!(entries[0]["description"], "Transfer from alice");

    // Alice's history is most recent first
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/account/transactions", Some(&alice)))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["kind"], "TRANSFER_OUT");
    assert_eq!(entries[0]["description"], "Transfer to bob");
    assert_eq!(entries[1]["kind"], "DEPOSIT");
}

#[tokio::test]
async fn test_transfer_failures() {
    let app = memory_app();
    register(&app, "alice", "pw1").await;
    register(&app, "bob", "pw2").await;
    let alice = basic_auth("alice", "pw1");

    let req = json_request(
        "POST",
        "/api/v1/account/transfer",
        Some(&alice),
        json!({ "to_username": "alice", "amount": "1" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "self_transfer");

    let req = json_request(
        "POST",
        "/api/v1/account/transfer",
        Some(&alice),
        json!({ "to_username": "nobody", "amount": "1" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_code"], "account_not_found");

    let req = json_request(
        "POST",
        "/api/v1/account/transfer",
        Some(&alice),
        json!({ "to_username": "bob", "amount": "1" }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error_code"], "insufficient_funds");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let app = memory_app();
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
