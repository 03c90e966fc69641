//! HTTP boundary errors and the error mapper.
//!
//! Handlers return [`ApiError`]. Rendering happens in two steps:
//! `into_response` produces a provisional body and stashes the error as a
//! [`Failure`] extension; the envelope middleware, which knows the run mode
//! and request context, calls [`map_failure`] to build the final envelope.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::RunMode;
use crate::error::{DomainError, ServiceError};
use crate::http::validation::FieldError;
use crate::store::StoreError;

const STACK_LINES: usize = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input data")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("request entity too large")]
    PayloadTooLarge,

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::Unauthenticated(message.into()))
    }

    /// Infrastructure code carried by the failure, if any.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Store(e) => e.code(),
            _ => None,
        }
    }

    fn is_query_failure(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_query_failure())
    }

    /// Status the failure asks for explicitly.
    pub fn explicit_status(&self) -> Option<StatusCode> {
        match self {
            Self::Validation(_) => Some(StatusCode::BAD_REQUEST),
            Self::Domain(e) => Some(match e {
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            }),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => Self::Domain(e),
            ServiceError::Store(e) => Self::Store(e),
            ServiceError::Internal(e) => Self::Internal(e),
        }
    }
}

/// The failure behind an error response, read back by the envelope middleware.
#[derive(Debug, Clone)]
pub struct Failure(pub Arc<ApiError>);

/// Rendered form of a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
    pub details: Option<Value>,
    pub stack: Option<Vec<String>>,
}

impl MappedError {
    fn new(status: StatusCode, error: &str, message: Option<&str>) -> Self {
        Self {
            status,
            error: error.to_string(),
            message: message.map(str::to_string),
            details: None,
            stack: None,
        }
    }

    /// Error payload ready for the envelope.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.error.clone()));
        if let Some(message) = &self.message {
            body.insert("message".into(), Value::String(message.clone()));
        }
        if let Some(details) = &self.details {
            body.insert("details".into(), details.clone());
        }
        if let Some(stack) = &self.stack {
            body.insert("stack".into(), json!(stack));
        }
        Value::Object(body)
    }
}

/// Classify a failure. The first matching rule wins: infrastructure codes,
/// query failures, malformed JSON, oversized payloads, explicit status,
/// then the generic 500.
pub fn map_failure(err: &ApiError, mode: RunMode) -> MappedError {
    match err.code() {
        Some("ECONNREFUSED") => {
            return MappedError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
                Some("Database connection error"),
            )
        }
        Some("23505") => {
            return MappedError::new(
                StatusCode::CONFLICT,
                "Data conflict",
                Some("Resource already exists"),
            )
        }
        Some("23503") => {
            return MappedError::new(
                StatusCode::BAD_REQUEST,
                "Invalid data",
                Some("Reference to nonexistent resource"),
            )
        }
        Some("23514") => {
            return MappedError::new(
                StatusCode::BAD_REQUEST,
                "Invalid data",
                Some("Data fails required constraints"),
            )
        }
        _ => {}
    }

    if err.is_query_failure() {
        return MappedError::new(
            StatusCode::BAD_REQUEST,
            "Query error",
            Some("Invalid data or malformed format"),
        );
    }

    match err {
        ApiError::MalformedJson(_) => {
            return MappedError::new(
                StatusCode::BAD_REQUEST,
                "Malformed JSON",
                Some("Invalid payload format"),
            )
        }
        ApiError::PayloadTooLarge => {
            return MappedError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload too large",
                Some("Request body exceeds the allowed size"),
            )
        }
        _ => {}
    }

    if let Some(status) = err.explicit_status() {
        let text = err.to_string();
        let mut mapped = MappedError::new(
            status,
            if text.is_empty() { "Request failed" } else { &text },
            None,
        );
        if let ApiError::Validation(details) = err {
            mapped.details = Some(json!(details));
        }
        return mapped;
    }

    match mode {
        RunMode::Development => {
            let mut mapped = MappedError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some(&err.to_string()),
            );
            mapped.stack = Some(
                format!("{:?}", err)
                    .lines()
                    .take(STACK_LINES)
                    .map(str::to_string)
                    .collect(),
            );
            mapped
        }
        RunMode::Production => MappedError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            Some("Something went wrong. Please try again later."),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Production mapping never leaks detail if the envelope stage is absent
        let mapped = map_failure(&self, RunMode::Production);
        let mut response = (mapped.status, Json(mapped.body())).into_response();
        response.extensions_mut().insert(Failure(Arc::new(self)));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn unique(constraint: &'static str) -> ApiError {
        ApiError::Store(StoreError::UniqueViolation { constraint })
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        for constraint in ["users_email_key", "anything else", ""] {
            for mode in [RunMode::Development, RunMode::Production] {
                let mapped = map_failure(&unique(constraint), mode);
                assert_eq!(mapped.status, StatusCode::CONFLICT);
                assert_eq!(mapped.error, "Data conflict");
                assert_eq!(mapped.message.as_deref(), Some("Resource already exists"));
            }
        }
    }

    #[test]
    fn test_store_codes() {
        let cases = [
            (StoreError::ConnectionRefused("db down".into()), 503, "Service temporarily unavailable"),
            (StoreError::ForeignKeyViolation { constraint: "fk" }, 400, "Invalid data"),
            (StoreError::CheckViolation { constraint: "ck" }, 400, "Invalid data"),
            (StoreError::QueryFailed("syntax".into()), 400, "Query error"),
        ];
        for (err, status, error) in cases {
            let mapped = map_failure(&ApiError::Store(err), RunMode::Production);
            assert_eq!(mapped.status.as_u16(), status);
            assert_eq!(mapped.error, error);
        }
    }

    #[test]
    fn test_body_failures() {
        let mapped = map_failure(&ApiError::MalformedJson("eof".into()), RunMode::Production);
        assert_eq!(mapped.status, StatusCode::BAD_REQUEST);
        assert_eq!(mapped.error, "Malformed JSON");

        let mapped = map_failure(&ApiError::PayloadTooLarge, RunMode::Production);
        assert_eq!(mapped.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_domain_kinds() {
        let cases = [
            (DomainError::NotFound("Operation not found".into()), StatusCode::NOT_FOUND),
            (DomainError::Conflict("taken".into()), StatusCode::CONFLICT),
            (DomainError::Forbidden("nope".into()), StatusCode::FORBIDDEN),
            (DomainError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthenticated("Invalid token".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            let text = err.to_string();
            let mapped = map_failure(&ApiError::Domain(err), RunMode::Production);
            assert_eq!(mapped.status, status);
            assert_eq!(mapped.error, text);
            assert_eq!(mapped.message, None);
        }
    }

    #[test]
    fn test_validation_details() {
        let err = ApiError::Validation(vec![FieldError::new("email", "Valid email is required")]);
        let mapped = map_failure(&err, RunMode::Production);

        assert_eq!(mapped.status, StatusCode::BAD_REQUEST);
        assert_eq!(mapped.error, "Invalid input data");
        assert_eq!(
            mapped.details,
            Some(json!([{"field": "email", "message": "Valid email is required"}]))
        );
    }

    #[test]
    fn test_internal_hides_detail_in_production() {
        let err = ApiError::Internal(anyhow!("disk on fire"));

        let mapped = map_failure(&err, RunMode::Production);
        assert_eq!(mapped.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mapped.message.as_deref(), Some("Something went wrong. Please try again later."));
        assert_eq!(mapped.stack, None);

        let mapped = map_failure(&err, RunMode::Development);
        assert_eq!(mapped.message.as_deref(), Some("disk on fire"));
        let stack = mapped.stack.unwrap();
        assert!(!stack.is_empty() && stack.len() <= STACK_LINES);
    }

    #[test]
    fn test_into_response_carries_failure() {
        let response = ApiError::unauthenticated("Token expired").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let Failure(err) = response.extensions().get::<Failure>().unwrap();
        assert_eq!(err.to_string(), "Token expired");
    }
}
