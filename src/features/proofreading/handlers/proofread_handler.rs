use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::proofreading::dtos::ProofreadResponseDto;
use crate::features::proofreading::services::ProofreadingService;
use crate::shared::constants::MESSAGE_SUCCESS;

/// Proofread an upload through the grammar-check service
///
/// Blocks until the service finishes; results are recorded on success and
/// the upload is marked `failed` otherwise.
#[utoipa::path(
    post,
    path = "/api/uploads/{upload_id}/proofread",
    tag = "proofreading",
    params(
        ("upload_id" = i64, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Proofreading finished", body = ProofreadResponseDto),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Upload not found"),
        (status = 502, description = "Proofreading service failed"),
        (status = 503, description = "Proofreading service not configured")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn proofread_upload(
    user: AuthenticatedUser,
    State(service): State<Arc<ProofreadingService>>,
    Path(upload_id): Path<i64>,
) -> Result<Json<ProofreadResponseDto>> {
    let info = service.proofread_upload(&user, upload_id).await?;

    Ok(Json(ProofreadResponseDto {
        message: MESSAGE_SUCCESS.to_string(),
        info,
    }))
}
