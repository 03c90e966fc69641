//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the middleware pipeline in order
//! - Bind to a listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::auth::{AuthService, TokenManager};
use crate::config::AppConfig;
use crate::http::middleware::{auth_middleware, envelope_middleware, request_logger};
use crate::http::request::{MakeLedgerRequestId, X_REQUEST_ID};
use crate::http::{auth, health, operations};
use crate::ledger::LedgerService;
use crate::lifecycle::shutdown;
use crate::security::headers;
use crate::security::rate_limit::{
    rate_limit_middleware, FixedWindowLimiter, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING,
    X_RATELIMIT_RESET,
};
use crate::store::Store;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub ledger: LedgerService,
    pub limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let tokens = TokenManager::new(&config.auth);
        Self {
            auth: AuthService::new(store.clone(), tokens),
            ledger: LedgerService::new(store),
            limiter: Arc::new(FixedWindowLimiter::new(&config.rate_limit)),
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the ledger API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let state = AppState::new(config, store);
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.state.config.mode,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router with the full middleware pipeline.
///
/// Layers, outermost first: CORS, security headers, request id, request id
/// propagation, envelope, request logger, rate limiter, body limit.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let protected = Router::new()
        .route(
            "/api/operations",
            post(operations::create_operation).get(operations::list_operations),
        )
        .route("/api/operations/{id}", get(operations::get_operation))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .route("/api/healthcheck", get(health::healthcheck))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/validate", get(auth::validate))
        .merge(protected)
        // Method mismatches on known paths are unmatched routes too
        .method_not_allowed_fallback(route_not_found)
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(config.clone(), request_logger))
        .layer(middleware::from_fn_with_state(config.clone(), envelope_middleware))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeLedgerRequestId));

    let router = if config.security.enable_headers {
        headers::apply(router)
    } else {
        router
    };

    router.layer(cors_layer(&config))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, X_REQUEST_ID])
        .expose_headers([
            X_REQUEST_ID,
            X_RATELIMIT_LIMIT,
            X_RATELIMIT_REMAINING,
            X_RATELIMIT_RESET,
            header::RETRY_AFTER,
        ]);

    let origin = config.server.cors_origin.trim();
    // Credentials cannot be combined with a wildcard origin
    if origin == "*" {
        return cors.allow_origin(AllowOrigin::any());
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => cors.allow_origin(value).allow_credentials(true),
        Err(_) => {
            tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
            cors
        }
    }
}

async fn route_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found", "path": uri.path() })),
    )
}
