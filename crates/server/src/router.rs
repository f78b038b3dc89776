//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        // Literal `last_hour` segments take precedence over `{partition}`.
        .route(
            "/partition/last_hour/exists/in-bucket",
            get(api::check_last_hour_partition_exists),
        )
        .route("/partition/last_hour/ingest", put(api::ingest_last_hour_partition))
        .route(
            "/partition/{partition}/exists/in-bucket",
            get(api::check_partition_exists),
        )
        .route("/partition/{partition}/ingest", put(api::ingest_partition))
        .route("/load_job/{job_id}/status", get(api::load_job_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}
