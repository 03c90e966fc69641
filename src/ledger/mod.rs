//! Ledger subsystem: buy/sell operations owned by users.
//!
//! # Design Decisions
//! - Rule failures are `DomainError` kinds, not message patterns
//! - Creation re-checks the rules the HTTP layer already validated; the
//!   store enforces the owner reference and positive amount on insert

pub mod service;

pub use service::{
    LedgerService, OperationDraft, OperationPage, OperationView, Pagination, MAX_PAGE_SIZE,
};
