//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ledger_api::config::{AppConfig, RunMode};
use ledger_api::store::{
    InMemoryStore, NewOperation, NewUser, Operation, Store, StoreError, StoreResult, User,
};
use ledger_api::HttpServer;

pub const PASSWORD: &str = "secret123";

/// Development config with a real secret and a generous rate limit.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = RunMode::Development;
    config.auth.jwt_secret = "integration_test_secret".to_string();
    config.rate_limit.max_requests = 1_000;
    config
}

pub fn app() -> Router {
    app_with(test_config(), Arc::new(InMemoryStore::new()))
}

pub fn app_with(config: AppConfig, store: Arc<dyn Store>) -> Router {
    HttpServer::new(config, store).router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("response body is not JSON")
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        bytes,
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    send(app, request(Method::GET, uri, token, None)).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
    send(app, request(Method::POST, uri, token, Some(body))).await
}

/// Register a user and return its token.
pub async fn register(app: &Router, email: &str) -> String {
    let res = post(
        app,
        "/api/auth/register",
        None,
        json!({
            "email": email,
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace",
        }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.json());
    res.json()["data"]["token"].as_str().unwrap().to_string()
}

/// A store whose backend is never reachable.
pub struct UnreachableStore;

fn refused<T>() -> StoreResult<T> {
    Err(StoreError::ConnectionRefused("connect ECONNREFUSED 127.0.0.1:5432".into()))
}

#[async_trait]
impl Store for UnreachableStore {
    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        refused()
    }

    async fn find_user_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
        refused()
    }

    async fn insert_user(&self, _user: NewUser) -> StoreResult<User> {
        refused()
    }

    async fn insert_operation(&self, _operation: NewOperation) -> StoreResult<Operation> {
        refused()
    }

    async fn find_operation(&self, _id: Uuid) -> StoreResult<Option<Operation>> {
        refused()
    }

    async fn list_operations(
        &self,
        _user_id: Uuid,
        _limit: u32,
        _offset: u64,
    ) -> StoreResult<Vec<Operation>> {
        refused()
    }

    async fn count_operations(&self, _user_id: Uuid) -> StoreResult<u64> {
        refused()
    }
}
