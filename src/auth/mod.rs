//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! register/login:
//!     validated input → service.rs → password.rs (argon2) → Store
//!     → jwt.rs issues a bearer token
//!
//! protected request:
//!     Authorization header → jwt.rs verify (stateless)
//!     → Principal attached to request extensions
//! ```
//!
//! # Design Decisions
//! - Password hashing runs on the blocking pool
//! - Guard verification never touches the store; `/validate` does

pub mod jwt;
pub mod password;
pub mod service;

use uuid::Uuid;

pub use jwt::{TokenError, TokenManager};
pub use service::{AuthService, AuthSession, Registration, UserProfile};

/// Identity attached to a request after successful token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}
