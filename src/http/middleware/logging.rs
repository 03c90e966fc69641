//! Request logging middleware.
//!
//! Logs a start and a completion line per request and records request
//! metrics. Outside production, mutating requests also have their JSON body
//! logged with password fields masked.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::http::error::ApiError;
use crate::http::request::{generate_request_id, request_id_of, RequestContext};
use crate::http::response::truthy;
use crate::observability::metrics;

/// Replacement for masked fields.
pub const REDACTED: &str = "[HIDDEN]";

/// Top-level body fields masked before logging. Exact names only.
const SENSITIVE_FIELDS: [&str; 2] = ["password", "confirmPassword"];

pub async fn request_logger(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| {
            RequestContext::new(request_id_of(&request).unwrap_or_else(generate_request_id))
        });
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let span = tracing::info_span!("request", request_id = %context.request_id);

    async move {
        tracing::info!(
            request_id = %context.request_id,
            method = %method,
            path = %path,
            "Request started"
        );

        let request = if config.is_development() && is_mutating(&method) {
            log_body(request, config.server.max_body_bytes).await
        } else {
            Ok(request)
        };

        let response = match request {
            Ok(request) => next.run(request).await,
            Err(err) => err.into_response(),
        };
        let status = response.status().as_u16();

        tracing::info!(
            request_id = %context.request_id,
            method = %method,
            path = %path,
            status,
            elapsed_ms = context.elapsed_ms(),
            "Request completed"
        );
        metrics::record_request(method.as_str(), status, context.started_at);

        response
    }
    .instrument(span)
    .await
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Buffer, log and restore the body.
///
/// A declared length over `limit` is left for the body limit to reject.
/// Bodies without a declared length are buffered up to `limit`. Once the
/// body has been consumed a read failure cannot be replayed, so it is
/// rejected here the way the body extractors would reject it.
async fn log_body(request: Request, limit: usize) -> Result<Request, ApiError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Ok(request);
    }

    let (parts, body) = request.into_parts();
    match to_bytes(body, limit).await {
        Ok(bytes) => {
            if let Some(body) = redact_body(&bytes) {
                tracing::info!(body = %body, "Request body");
            }
            Ok(Request::from_parts(parts, Body::from(bytes)))
        }
        Err(e) if exceeds_limit(&e) => Err(ApiError::PayloadTooLarge),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body");
            Err(ApiError::status(
                StatusCode::BAD_REQUEST,
                "Failed to buffer the request body",
            ))
        }
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// JSON body with sensitive fields masked, or `None` if it is not JSON.
pub fn redact_body(bytes: &[u8]) -> Option<String> {
    let mut value: Value = serde_json::from_slice(bytes).ok()?;
    if let Value::Object(fields) = &mut value {
        for key in SENSITIVE_FIELDS {
            if let Some(field) = fields.get_mut(key).filter(|v| truthy(v)) {
                *field = Value::String(REDACTED.into());
            }
        }
    }
    Some(value.to_string())
}
