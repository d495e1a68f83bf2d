//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub use api::{
    AggregateListResponse, AggregateSummary, ErrorResponse, HealthResponse, LaunchResponse,
    ResetResponse, UpdateRequest, UpdateResponse, SESSION_COOKIE,
};

/// Create the HTTP router with all routes configured
///
/// The exercise iframe is typically served from the platform's origin,
/// so the update endpoint is CORS-permissive.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/launch", post(api::launch))
        .route("/api/update", post(api::update))
        .route("/api/admin/aggregates", get(api::list_aggregates))
        .route("/api/admin/aggregates/reset", post(api::reset_aggregate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
