use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, ErrorField};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::uploads::dtos::{
    is_pdf_upload, MessageResponseDto, ProcessedFileInfoDto, RecentFilesResponseDto,
    SubmitProcessedFileDto, UploadPdfDto, UploadResponseDto,
};
use crate::features::uploads::models::OutputKind;
use crate::features::uploads::services::UploadService;
use crate::shared::constants::MESSAGE_SUCCESS;

/// Upload a PDF
///
/// Accepts multipart/form-data with a single `file` field.
#[utoipa::path(
    post,
    path = "/api/submit_upload_files",
    tag = "uploads",
    request_body(
        content = UploadPdfDto,
        content_type = "multipart/form-data",
        description = "PDF upload form",
    ),
    responses(
        (status = 201, description = "File stored", body = UploadResponseDto),
        (status = 400, description = "Missing, empty or non-PDF file"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponseDto>), AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = field.bytes().await.map_err(multipart_error)?;

        file = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("No file uploaded.".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty.".to_string()));
    }

    let max = service.max_upload_size();
    if data.len() > max {
        return Err(file_too_large(max));
    }

    if !is_pdf_upload(&content_type, &file_name, &data) {
        return Err(AppError::BadRequest(
            "Only PDF files are allowed.".to_string(),
        ));
    }

    let response = service.upload_pdf(&user, &file_name, data).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// A body cut off by the request size limit is reported as too large
fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large.".to_string())
    } else {
        AppError::BadRequest(format!("File upload error: {}", e))
    }
}

fn file_too_large(max: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File too large. Maximum size is {} bytes ({} MB)",
        max,
        max / 1024 / 1024
    ))
}

/// Record proofreading results for an upload
#[utoipa::path(
    post,
    path = "/api/submit_processed_files",
    tag = "uploads",
    request_body = SubmitProcessedFileDto,
    responses(
        (status = 200, description = "Results recorded", body = MessageResponseDto),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Upload not found")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn submit_processed_file(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    AppJson(dto): AppJson<SubmitProcessedFileDto>,
) -> Result<Json<MessageResponseDto>, ErrorField> {
    dto.validate()
        .map_err(|_| AppError::Validation("Missing required fields".to_string()))?;

    service.submit_processed(&user, dto).await?;

    Ok(Json(MessageResponseDto::success()))
}

/// List the caller's uploads with their processing records
#[utoipa::path(
    get,
    path = "/api/get_recent_files",
    tag = "uploads",
    responses(
        (status = 200, description = "Recent files (possibly empty)", body = RecentFilesResponseDto),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Query failed", body = RecentFilesResponseDto)
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_recent_files(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
) -> Response {
    match service.recent_files(&user).await {
        Ok(rows) => Json(RecentFilesResponseDto::success(rows)).into_response(),
        Err(e) => {
            let (status, reason) = e.status_and_message();
            (status, Json(RecentFilesResponseDto::failure(reason))).into_response()
        }
    }
}

/// Get one processed-file record
#[utoipa::path(
    get,
    path = "/api/processed_files/{processed_id}",
    tag = "uploads",
    params(
        ("processed_id" = i64, Path, description = "Processed file ID")
    ),
    responses(
        (status = 200, description = "Processed file found", body = ProcessedFileInfoDto),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Processed file not found")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_processed_file(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    Path(processed_id): Path<i64>,
) -> Result<Json<ProcessedFileInfoDto>, AppError> {
    let record = service.processed_file(&user, processed_id).await?;

    Ok(Json(ProcessedFileInfoDto {
        message: MESSAGE_SUCCESS.to_string(),
        info: vec![record],
    }))
}

async fn output_file(
    service: &UploadService,
    user: &AuthenticatedUser,
    kind: OutputKind,
    name: &str,
) -> Result<Response, AppError> {
    let data = service.output_file(user, kind, name).await?;
    Ok(([(header::CONTENT_TYPE, kind.content_type())], data).into_response())
}

/// Download a comparison artifact of one of the caller's uploads
#[utoipa::path(
    get,
    path = "/json/{name}",
    tag = "uploads",
    params(
        ("name" = String, Path, description = "Artifact filename recorded for the upload")
    ),
    responses(
        (status = 200, description = "Artifact JSON (application/json)"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_artifact_file(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    output_file(&service, &user, OutputKind::Artifact, &name).await
}

/// Download the proofread PDF of one of the caller's uploads
#[utoipa::path(
    get,
    path = "/generated/{name}",
    tag = "uploads",
    params(
        ("name" = String, Path, description = "Proofread PDF filename recorded for the upload")
    ),
    responses(
        (status = 200, description = "Proofread PDF (application/pdf)"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_generated_file(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    output_file(&service, &user, OutputKind::ProofreadPdf, &name).await
}
