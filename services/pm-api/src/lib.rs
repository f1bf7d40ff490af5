//! PM2.5 estimation HTTP service.
//!
//! Accepts AOD, meteorology and boundary layer height grids, aligns them on
//! rounded coordinates, runs the PM2.5 model and publishes a CSV and a map
//! per request under `/static/<request_id>/`.

pub mod cleanup;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod state;
pub mod upload;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use state::AppState;

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.output_dir);
    let limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
