//! Response envelope middleware.
//!
//! Creates the [`RequestContext`] on the way in and re-shapes the body on
//! the way out:
//!
//! 1. A [`Failure`] left by an `ApiError` is rendered through the error mapper.
//! 2. Any other status >= 400 gets the error envelope.
//! 3. Excluded paths pass through untouched.
//! 4. JSON bodies get the success envelope; anything else passes through.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, response::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::http::error::{map_failure, Failure};
use crate::http::request::{generate_request_id, request_id_of, RequestContext};
use crate::http::response::{envelope_error, envelope_success, Meta};

pub async fn envelope_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::new(request_id_of(&request).unwrap_or_else(generate_request_id));
    request.extensions_mut().insert(context.clone());

    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let full_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| path.clone());

    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();
    let failure = parts.extensions.remove::<Failure>();
    let is_error = failure.is_some() || parts.status.as_u16() >= 400;

    if !is_error && (config.api.is_excluded(&path) || !is_json(&parts)) {
        return Response::from_parts(parts, body);
    }

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body");
            parts.status = StatusCode::INTERNAL_SERVER_ERROR;
            let meta = Meta::now(
                full_path,
                method,
                parts.status.as_u16(),
                context.request_id.as_str(),
                context.elapsed_ms(),
                config.api.version(),
            );
            let payload = json!({ "error": "Internal server error" });
            return json_response(parts, envelope_error(&payload, meta));
        }
    };

    let payload = match failure {
        Some(Failure(err)) => {
            let mapped = map_failure(&err, config.mode);
            if mapped.status.is_server_error() {
                tracing::error!(status = mapped.status.as_u16(), error = ?err, "Request failed");
            } else {
                tracing::warn!(status = mapped.status.as_u16(), error = %err, "Request failed");
            }
            parts.status = mapped.status;
            mapped.body()
        }
        None if is_error => error_payload(&bytes),
        None => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(_) => return Response::from_parts(parts, Body::from(bytes)),
        },
    };

    let meta = Meta::now(
        full_path,
        method,
        parts.status.as_u16(),
        context.request_id.as_str(),
        context.elapsed_ms(),
        config.api.version(),
    );
    let envelope = if is_error {
        envelope_error(&payload, meta)
    } else {
        envelope_success(payload, meta)
    };

    json_response(parts, envelope)
}

fn json_response(mut parts: Parts, envelope: Value) -> Response {
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(envelope.to_string()))
}

fn is_json(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Error payload from a non-failure body: JSON as is, text as the error.
fn error_payload(bytes: &Bytes) -> Value {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return value;
    }
    match std::str::from_utf8(bytes).map(str::trim) {
        Ok(text) if !text.is_empty() => json!({ "error": text }),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use http_body_util::{Full, Limited};
    use tower::ServiceExt;

    // Body that fails on first poll
    async fn broken_body() -> Response {
        let body = Body::new(Limited::new(Full::new(Bytes::from_static(b"{\"a\":1}")), 1));
        axum::http::Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_body_is_enveloped() {
        let config = Arc::new(AppConfig::default());
        let app = Router::new()
            .route("/broken", get(broken_body))
            .layer(middleware::from_fn_with_state(config, envelope_middleware));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["meta"]["statusCode"], 500);
        assert_eq!(body["meta"]["path"], "/broken");
    }

    #[test]
    fn test_error_payload() {
        assert_eq!(
            error_payload(&Bytes::from_static(b"{\"error\":\"x\"}")),
            json!({"error": "x"})
        );
        assert_eq!(
            error_payload(&Bytes::from_static(b"Method Not Allowed")),
            json!({"error": "Method Not Allowed"})
        );
        assert_eq!(error_payload(&Bytes::new()), Value::Null);
    }
}
