//! Request pipeline middleware.
//!
//! # Order (outermost first)
//! ```text
//! envelope.rs  → RequestContext in, uniform envelope out
//! logging.rs   → start/completion lines inside a request span
//! [rate limiter, body limit, router]
//! auth.rs      → route layer on protected routes only
//! ```

pub mod auth;
pub mod envelope;
pub mod logging;

pub use auth::auth_middleware;
pub use envelope::envelope_middleware;
pub use logging::request_logger;
