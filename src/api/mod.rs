//! # HTTP API
//!
//! - `POST /api/preprocess`: binarize an image, same format back
//! - `POST /api/recognize`: read the text in an image
//!
//! Anything else is served from the static directory.

pub mod dto;
pub mod handlers;
pub mod state;

pub use state::AppState;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the service router
pub fn create_router(state: AppState, static_dir: impl AsRef<Path>, max_request_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/preprocess",
            post(handlers::preprocess).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/recognize",
            post(handlers::recognize).fallback(handlers::method_not_allowed),
        )
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
