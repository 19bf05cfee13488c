use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::comparison::handlers;
use crate::features::comparison::services::ComparisonService;

/// Create routes for the comparison feature
pub fn routes(service: Arc<ComparisonService>) -> Router {
    Router::new()
        .route("/api/comparison/{upload_id}", get(handlers::get_comparison))
        .route(
            "/api/comparison/{upload_id}/accept",
            post(handlers::accept_suggestions),
        )
        .route("/comparison/{upload_id}", get(handlers::comparison_page))
        .with_state(service)
}
