//! HTTP API Layer
//!
//! REST API for CID intake and status queries, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: upload, submission, queries, health and the mock insurer
//! - **Middleware**: request ids, tracing, request logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: consistent `{error, message, details}` responses
//!
//! Every route is served both at the root and under `/api`.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_dispatch::CidService;

use crate::config::ApiConfig;
use crate::handlers::{cid, health, mock_insurer, providers};
use crate::middleware::{request_logging_middleware, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: CidService,
    pub config: Arc<ApiConfig>,
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/providers", get(providers::list_providers))
        .route("/cid/upload-pdf", post(cid::upload_pdf))
        .route("/cid/submit", post(cid::submit_cid))
        .route("/cid/:claim_id", get(cid::get_cid))
        .route("/cids", get(cid::list_cids))
        .route("/mock/insurance/:provider/submit", post(mock_insurer::submit_claim))
}

/// Creates the main API router
///
/// # Arguments
///
/// * `service` - CID intake and query service
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(service: CidService, config: ApiConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let body_limit = config.max_body_bytes;
    let state = AppState {
        service,
        config: Arc::new(config),
    };

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_logging_middleware)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
