//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware pipeline)
//!     → request.rs (correlation id, RequestContext)
//!     → middleware/ (envelope, logging) → security (rate limit)
//!     → extract.rs + validation.rs (typed, validated input)
//!     → auth.rs / operations.rs / health.rs (handlers)
//!     → error.rs (ApiError → mapped failure)
//!     → response.rs (envelope shaping)
//!     → Send to client
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod operations;
pub mod request;
pub mod response;
pub mod server;
pub mod validation;

pub use error::ApiError;
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
