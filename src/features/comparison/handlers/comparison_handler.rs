use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::comparison::dtos::{
    AcceptSuggestionsDto, AcceptSuggestionsResponseDto, ComparisonDto,
};
use crate::features::comparison::services::ComparisonService;

/// Get the comparison of an upload's original and proofread text
#[utoipa::path(
    get,
    path = "/api/comparison/{upload_id}",
    tag = "comparison",
    params(
        ("upload_id" = i64, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Comparison view", body = ComparisonDto),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Upload or comparison data not found"),
        (status = 409, description = "Upload not proofread yet")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_comparison(
    user: AuthenticatedUser,
    State(service): State<Arc<ComparisonService>>,
    Path(upload_id): Path<i64>,
) -> Result<Json<ComparisonDto>> {
    let comparison = service.comparison(&user, upload_id).await?;
    Ok(Json(comparison))
}

/// Comparison page
#[utoipa::path(
    get,
    path = "/comparison/{upload_id}",
    tag = "comparison",
    params(
        ("upload_id" = i64, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Comparison page", content_type = "text/html"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Upload or comparison data not found"),
        (status = 409, description = "Upload not proofread yet")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn comparison_page(
    user: AuthenticatedUser,
    State(service): State<Arc<ComparisonService>>,
    Path(upload_id): Path<i64>,
) -> Result<Html<String>> {
    let html = service.comparison_page(&user, upload_id).await?;
    Ok(Html(html))
}

/// Accept all suggestions with the caller's dropdown selections
///
/// The chosen words are stored in the comparison data before the proofread
/// PDF is regenerated.
#[utoipa::path(
    post,
    path = "/api/comparison/{upload_id}/accept",
    tag = "comparison",
    params(
        ("upload_id" = i64, Path, description = "Upload ID")
    ),
    request_body = AcceptSuggestionsDto,
    responses(
        (status = 200, description = "Suggestions accepted", body = AcceptSuggestionsResponseDto),
        (status = 400, description = "Unknown slot or word"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Upload not found"),
        (status = 409, description = "Upload not proofread yet"),
        (status = 502, description = "Proofreading service failed")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn accept_suggestions(
    user: AuthenticatedUser,
    State(service): State<Arc<ComparisonService>>,
    Path(upload_id): Path<i64>,
    AppJson(dto): AppJson<AcceptSuggestionsDto>,
) -> Result<Json<AcceptSuggestionsResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service.accept(&user, upload_id, dto).await?;
    Ok(Json(response))
}
