//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! services (auth, ledger)
//!     → Store trait (async, object safe)
//!     → backend implementation (memory.rs)
//!     → StoreError on failure, classified later by the HTTP error mapper
//! ```
//!
//! # Design Decisions
//! - Services hold `Arc<dyn Store>`; the backend is chosen at startup
//! - Constraint failures carry relational error codes so the error mapper
//!   can classify them without knowing the backend
//! - Operation inserts check the owner reference and the amount constraint
//!   atomically with the write

pub mod memory;
pub mod model;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use model::{NewOperation, NewUser, Operation, OperationType, User};

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failures raised by a store backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// A unique constraint rejected the write.
    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    UniqueViolation { constraint: &'static str },

    /// A write referenced a row that does not exist.
    #[error("insert violates foreign key constraint \"{constraint}\"")]
    ForeignKeyViolation { constraint: &'static str },

    /// A check constraint rejected the row.
    #[error("new row violates check constraint \"{constraint}\"")]
    CheckViolation { constraint: &'static str },

    /// The query itself failed to execute.
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl StoreError {
    /// Relational error code for constraint and connectivity failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            StoreError::ConnectionRefused(_) => Some("ECONNREFUSED"),
            StoreError::UniqueViolation { .. } => Some("23505"),
            StoreError::ForeignKeyViolation { .. } => Some("23503"),
            StoreError::CheckViolation { .. } => Some("23514"),
            StoreError::QueryFailed(_) => None,
        }
    }

    /// Whether this belongs to the query-execution failure class.
    pub fn is_query_failure(&self) -> bool {
        !matches!(self, StoreError::ConnectionRefused(_))
    }
}

/// Storage for users and their operations.
#[async_trait]
pub trait Store: Send + Sync {
    /// Active user with this (lower-cased) e-mail.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Active user with this id.
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Insert a user. Fails with [`StoreError::UniqueViolation`] on a taken e-mail.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Insert an operation in a single unit of work.
    async fn insert_operation(&self, operation: NewOperation) -> StoreResult<Operation>;

    /// Operation by id, regardless of owner.
    async fn find_operation(&self, id: Uuid) -> StoreResult<Option<Operation>>;

    /// A user's operations, newest first.
    async fn list_operations(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Operation>>;

    /// Total operations owned by a user.
    async fn count_operations(&self, user_id: Uuid) -> StoreResult<u64>;
}
