//! Domain and service error types.
//!
//! Services never encode HTTP semantics in message text. They return a
//! [`DomainError`] kind and the HTTP boundary switches on the kind.

use thiserror::Error;

use crate::store::StoreError;

/// Business-rule failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthenticated(String),
}

/// Anything a service call can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result alias for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
