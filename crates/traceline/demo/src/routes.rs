//! Router assembly.

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/success", get(handlers::success))
        .route("/error", get(handlers::error))
        .route("/healthz", get(handlers::health_check))
        .route("/stats", get(handlers::pipeline_stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
