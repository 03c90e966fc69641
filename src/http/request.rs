//! Request identification and per-request context.
//!
//! # Responsibilities
//! - Generate correlation ids of the form `req_<unix-ms>_<13 base36 chars>`
//! - Reuse an id supplied by the client or an upstream layer
//! - Carry the id and start instant through request extensions

use std::time::Instant;

use axum::http::{HeaderName, HeaderValue, Request};
use chrono::Utc;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the correlation id on requests and responses.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 13;

/// Generator plugged into `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeLedgerRequestId;

impl MakeRequestId for MakeLedgerRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&generate_request_id())
            .ok()
            .map(RequestId::new)
    }
}

/// A fresh correlation id.
pub fn generate_request_id() -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[fastrand::usize(..BASE36.len())]))
        .collect();
    format!("req_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Per-request state created at pipeline entry.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            started_at: Instant::now(),
        }
    }

    /// Whole milliseconds since the request entered the pipeline.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Correlation id stored by `SetRequestIdLayer`, if any.
pub fn request_id_of<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_owned)
}
