//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and services produce:
//!     → logging.rs (structured log events, request_id span field)
//!     → metrics.rs (request counters, latency histogram, rejections)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON in production)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
