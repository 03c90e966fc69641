//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → rate_limit.rs (fixed-window check by client address)
//!     → allowed: continue, X-RateLimit-* headers on the way out
//!     → rejected: 429 with retryAfter, handler never runs
//!
//! Outbound response
//!     → headers.rs (hardening headers, never overwriting a handler's own)
//! ```

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, Decision, FixedWindowLimiter};
