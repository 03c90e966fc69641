//! End-to-end API flows through the full pipeline.

use axum::http::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use ledger_api::auth::jwt::Claims;

mod common;
use common::{app, get, post, register, PASSWORD};

#[tokio::test]
async fn test_register_and_login() {
    let app = app();

    let res = post(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "Ada@Example.com",
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace",
        }),
    )
    .await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert_eq!(body["data"]["user"]["firstName"], "Ada");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert_eq!(body["meta"]["statusCode"], 201);

    let res = post(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": "ada@example.com", "password": PASSWORD }),
    )
    .await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_duplicate_registration() {
    let app = app();
    register(&app, "dup@example.com").await;

    let res = post(
        &app,
        "/api/auth/register",
        None,
        json!({
            "email": "DUP@example.com",
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace",
        }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["error"], "User already exists with this email");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = app();
    let res = post(
        &app,
        "/api/auth/register",
        None,
        json!({ "email": "not-an-email", "password": "123", "firstName": "A", "lastName": "B2" }),
    )
    .await;
    let body = res.json();

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input data");
    let fields: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"firstName"));
    assert!(fields.contains(&"lastName"));
}

#[tokio::test]
async fn test_bad_credentials() {
    let app = app();
    register(&app, "a@example.com").await;

    let res = post(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": "a@example.com", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_validate_token() {
    let app = app();
    let token = register(&app, "v@example.com").await;

    let res = get(&app, "/api/auth/validate", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Token not provided");

    let res = get(&app, "/api/auth/validate", Some("garbage")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid token");

    let res = get(&app, "/api/auth/validate", Some(&token)).await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(body["message"], "Token valid");
    assert_eq!(body["data"]["user"]["email"], "v@example.com");
}

#[tokio::test]
async fn test_guard() {
    let app = app();

    let res = get(&app, "/api/operations", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Access token required");

    let res = get(&app, "/api/operations", Some("garbage")).await;
    assert_eq!(res.json()["error"], "Invalid token");

    let now = chrono::Utc::now().timestamp();
    let expired = encode(
        &Header::default(),
        &Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@example.com".into(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "ledger-api".into(),
        },
        &EncodingKey::from_secret(b"integration_test_secret"),
    )
    .unwrap();
    let res = get(&app, "/api/operations", Some(&expired)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Token expired");
}

#[tokio::test]
async fn test_operation_lifecycle() {
    let app = app();
    let token = register(&app, "trader@example.com").await;

    let res = post(
        &app,
        "/api/operations",
        Some(&token),
        json!({ "type": "buy", "amount": 150.255, "currency": "USD" }),
    )
    .await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "buy");
    assert_eq!(body["data"]["currency"], "USD");
    assert_eq!(body["meta"]["statusCode"], 201);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let res = get(&app, &format!("/api/operations/{}", id), Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["id"], id);

    let res = get(&app, &format!("/api/operations/{}", Uuid::new_v4()), Some(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "Operation not found");

    let res = get(&app, "/api/operations/not-a-uuid", Some(&token)).await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "ID must be a valid UUID");
}

#[tokio::test]
async fn test_operation_ownership() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let other = register(&app, "other@example.com").await;

    let res = post(
        &app,
        "/api/operations",
        Some(&owner),
        json!({ "type": "sell", "amount": 10, "currency": "EUR" }),
    )
    .await;
    let id = res.json()["data"]["id"].as_str().unwrap().to_string();

    let res = get(&app, &format!("/api/operations/{}", id), Some(&other)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(
        res.json()["error"],
        "You do not have permission to view this operation"
    );
}

#[tokio::test]
async fn test_paginated_listing() {
    let app = app();
    let token = register(&app, "lister@example.com").await;

    for amount in [1, 2, 3] {
        let res = post(
            &app,
            "/api/operations",
            Some(&token),
            json!({ "type": "buy", "amount": amount, "currency": "BTC" }),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = get(&app, "/api/operations?page=1&limit=2", Some(&token)).await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["count"], 2);
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 2, "total": 3, "totalPages": 2 })
    );

    let res = get(&app, "/api/operations", Some(&token)).await;
    assert_eq!(res.json()["pagination"]["limit"], 10);

    let res = get(&app, "/api/operations?limit=101", Some(&token)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid input data");
}

#[tokio::test]
async fn test_operation_validation() {
    let app = app();
    let token = register(&app, "v2@example.com").await;

    let res = post(
        &app,
        "/api/operations",
        Some(&token),
        json!({ "type": "hold", "amount": 0, "currency": "usd" }),
    )
    .await;
    let body = res.json();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 3);

    // Wrong JSON type is a validation failure, not malformed JSON
    let res = post(
        &app,
        "/api/operations",
        Some(&token),
        json!({ "type": "buy", "amount": "ten", "currency": "USD" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Invalid input data");
}
