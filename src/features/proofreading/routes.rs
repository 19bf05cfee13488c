use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::proofreading::handlers;
use crate::features::proofreading::services::ProofreadingService;

/// Create routes for the proofreading feature
pub fn routes(service: Arc<ProofreadingService>) -> Router {
    Router::new()
        .route(
            "/api/uploads/{upload_id}/proofread",
            post(handlers::proofread_upload),
        )
        .with_state(service)
}
