use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::uploads::handlers::{
    get_artifact_file, get_generated_file, get_processed_file, get_recent_files,
    submit_processed_file, upload_file,
};
use crate::features::uploads::services::UploadService;

/// Create routes for the uploads feature
///
/// The `.php` paths stay mounted for pages that still post to them.
/// Proofreading outputs under `/json` and `/generated` are served to the
/// owner of the upload only.
pub fn routes(service: Arc<UploadService>) -> Router {
    // Allow body size up to the upload limit + buffer for multipart overhead
    let body_limit = service.max_upload_size() + 1024 * 1024;

    Router::new()
        .route(
            "/api/submit_upload_files",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/submit_upload_files.php",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/submit_processed_files", post(submit_processed_file))
        .route("/api/submit_processed_files.php", post(submit_processed_file))
        .route("/api/get_recent_files", get(get_recent_files))
        .route("/api/get_recent_files.php", get(get_recent_files))
        .route("/api/processed_files/{processed_id}", get(get_processed_file))
        .route("/json/{name}", get(get_artifact_file))
        .route("/generated/{name}", get(get_generated_file))
        .with_state(service)
}
