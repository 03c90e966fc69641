//! Ledger API library: a small REST service for recording buy/sell
//! operations behind bearer-token authentication, with a uniform response
//! envelope, correlation ids, fixed-window rate limiting and a central
//! error mapper.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
