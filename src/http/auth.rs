//! `/api/auth` handlers.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::auth::AuthSession;
use crate::http::error::ApiError;
use crate::http::extract::ApiJson;
use crate::http::middleware::auth::bearer_token;
use crate::http::server::AppState;
use crate::http::validation::{validate_login, validate_registration, LoginBody, RegisterBody};

fn session_body(message: &str, session: AuthSession) -> Value {
    json!({
        "message": message,
        "token": session.token,
        "user": session.user,
    })
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = validate_login(body)?;
    let session = state.auth.login(&email, &password).await?;
    Ok(Json(session_body("Login successful", session)))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let registration = validate_registration(body)?;
    let session = state.auth.register(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(session_body("User registered successfully", session)),
    ))
}

pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::unauthenticated("Token not provided"))?;
    let user = state.auth.validate_token(token).await?;
    Ok(Json(json!({ "message": "Token valid", "user": user })))
}
