//! Fixed-window rate limiting middleware.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::json;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Longest window honoured (one day).
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// Bucket shared by every client whose address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Requests seen from one client in the current window.
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    /// Remaining allowance, floored at zero.
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Seconds until the window resets, rounded up.
    pub retry_after_secs: u64,
}

impl Decision {
    /// Write the `X-RateLimit-*` headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        if let Ok(reset) =
            HeaderValue::from_str(&self.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        {
            headers.insert(X_RATELIMIT_RESET, reset);
        }
    }
}

/// In-memory fixed-window counter keyed by client.
///
/// The map is bounded by `max_tracked_clients`: a new client arriving at
/// capacity first purges expired windows, then evicts the client whose
/// window resets soonest.
pub struct FixedWindowLimiter {
    counters: Mutex<HashMap<String, WindowCounter>>,
    window: Duration,
    max_requests: u32,
    max_tracked_clients: usize,
    enabled: bool,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            window: Duration::milliseconds(config.window_ms.min(MAX_WINDOW_MS) as i64),
            max_requests: config.max_requests,
            max_tracked_clients: config.max_tracked_clients.max(1),
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Count a request from `client` now.
    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Utc::now())
    }

    /// Count a request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: DateTime<Utc>) -> Decision {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        // Lazy expiry: a stale window is treated as absent
        if counters.get(client).is_some_and(|c| now > c.reset_at) {
            counters.remove(client);
        }

        let counter = match counters.get_mut(client) {
            Some(counter) => {
                counter.count = counter.count.saturating_add(1);
                *counter
            }
            None => {
                if counters.len() >= self.max_tracked_clients {
                    Self::make_room(&mut counters, now, self.max_tracked_clients);
                }
                let counter = WindowCounter {
                    count: 1,
                    reset_at: now + self.window,
                };
                counters.insert(client.to_string(), counter);
                counter
            }
        };
        drop(counters);

        let retry_after_ms = (counter.reset_at - now).num_milliseconds().max(0) as u64;
        Decision {
            allowed: counter.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(counter.count),
            reset_at: counter.reset_at,
            retry_after_secs: retry_after_ms.div_ceil(1000),
        }
    }

    fn make_room(counters: &mut HashMap<String, WindowCounter>, now: DateTime<Utc>, capacity: usize) {
        counters.retain(|_, c| now <= c.reset_at);

        while counters.len() >= capacity {
            let oldest = counters
                .iter()
                .min_by_key(|(_, c)| c.reset_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    counters.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Client key: remote IP, or the shared [`UNKNOWN_CLIENT`] bucket.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware function for fixed-window rate limiting.
///
/// Headers are written on every response, allowed or rejected.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = client_key(&request);
    let decision = limiter.check(&client);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %client,
            limit = decision.limit,
            retry_after = decision.retry_after_secs,
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();
        rejection(&limiter, &decision)
    };

    decision.apply_headers(response.headers_mut());
    response
}

fn rejection(limiter: &FixedWindowLimiter, decision: &Decision) -> Response {
    let window_minutes = limiter.window().num_milliseconds() as f64 / 60_000.0;
    let body = json!({
        "error": "Too many requests",
        "message": format!(
            "Limit of {} requests per {} minutes exceeded",
            decision.limit, window_minutes
        ),
        "retryAfter": decision.retry_after_secs,
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(decision.retry_after_secs));
    response
}
