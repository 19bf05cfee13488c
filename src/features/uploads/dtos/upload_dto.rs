use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::uploads::models::{ProcessedFile, ProcessingResult, RecentFileRow, UploadStatus};
use crate::shared::constants::{
    DISPLAY_DATE_FORMAT, MESSAGE_ERROR, MESSAGE_SUCCESS, PDF_MAGIC, PDF_MIME_TYPE,
};
use crate::shared::types::{deserialize_loose_f64, deserialize_loose_i64};

/// Upload form for OpenAPI documentation
/// Note: the handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadPdfDto {
    /// The PDF to upload
    #[schema(format = Binary, content_media_type = "application/pdf")]
    pub file: String,
}

/// Response for a stored upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    pub success: bool,
    pub message: String,
    pub upload_id: i64,
    /// Unique stored filename
    pub custom_name: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub status: UploadStatus,
}

/// Finalized proofreading results posted by the browser
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitProcessedFileDto {
    /// Upload id
    #[serde(default, deserialize_with = "deserialize_loose_i64")]
    #[validate(required, range(min = 1))]
    #[schema(value_type = Option<i64>, example = 17)]
    pub id: Option<i64>,

    /// Generated PDF filename
    #[serde(default)]
    #[validate(required, length(min = 1))]
    #[schema(example = "0197aa_Paper.pdf")]
    pub pdf: Option<String>,

    /// Comparison artifact filename
    #[serde(default)]
    #[validate(required, length(min = 1))]
    #[schema(example = "0197aa_Paper.json")]
    pub json: Option<String>,

    /// Processing time in seconds
    #[serde(default, deserialize_with = "deserialize_loose_f64")]
    #[validate(required, range(exclusive_min = 0.0))]
    #[schema(value_type = Option<f64>, example = 27.56)]
    pub time: Option<f64>,

    /// Number of improved paragraphs
    #[serde(default, deserialize_with = "deserialize_loose_i64")]
    #[validate(required, range(min = 1, max = 2147483647))]
    #[schema(value_type = Option<i64>, example = 50)]
    pub improvements: Option<i64>,
}

impl SubmitProcessedFileDto {
    /// Upload id and result, once every field is present
    pub fn into_result(self) -> Option<(i64, ProcessingResult)> {
        Some((
            self.id?,
            ProcessingResult {
                processed_file_path: self.pdf?,
                proof_data_path: self.json?,
                error_count: i32::try_from(self.improvements?).ok()?,
                processing_time: self.time?,
            },
        ))
    }
}

/// `{"message": "success"}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponseDto {
    pub message: String,
}

impl MessageResponseDto {
    pub fn success() -> Self {
        Self {
            message: MESSAGE_SUCCESS.to_string(),
        }
    }
}

/// One row of the recent-files listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentFileDto {
    pub upload_id: i64,
    pub processed_id: i64,
    pub original_filename: String,
    /// Stored path of the uploaded PDF
    pub original_file: String,
    /// Generated PDF filename, once proofread
    pub proofread_file: Option<String>,
    pub file_size: i64,
    /// `YYYY-MM-DD hh:mm:ss am|pm`
    #[schema(example = "2025-06-01 03:04:05 pm")]
    pub upload_date: String,
    /// Comparison artifact filename, once proofread
    pub json_data: Option<String>,
    pub status: UploadStatus,
}

impl From<RecentFileRow> for RecentFileDto {
    fn from(row: RecentFileRow) -> Self {
        Self {
            upload_id: row.upload_id,
            processed_id: row.processed_id,
            original_filename: row.original_filename,
            original_file: row.original_file,
            proofread_file: row.proofread_file,
            file_size: row.file_size,
            upload_date: format_display_date(&row.upload_date),
            json_data: row.json_data,
            status: UploadStatus::from_db(&row.status),
        }
    }
}

/// Envelope of the recent-files listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentFilesResponseDto {
    /// `success` or `error`
    pub message: String,
    pub result: Option<Vec<RecentFileDto>>,
    /// Failure reason
    pub resultmsg: Option<String>,
}

impl RecentFilesResponseDto {
    pub fn success(rows: Vec<RecentFileDto>) -> Self {
        Self {
            message: MESSAGE_SUCCESS.to_string(),
            result: Some(rows),
            resultmsg: None,
        }
    }

    pub fn failure(reason: String) -> Self {
        Self {
            message: MESSAGE_ERROR.to_string(),
            result: None,
            resultmsg: Some(reason),
        }
    }
}

/// A processed-file record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessedFileDto {
    pub processed_id: i64,
    pub upload_id: i64,
    pub processed_file_path: Option<String>,
    pub proof_data_path: Option<String>,
    pub error_count: i32,
    pub processing_time: Option<f64>,
    pub processed_date: Option<DateTime<Utc>>,
}

impl From<ProcessedFile> for ProcessedFileDto {
    fn from(row: ProcessedFile) -> Self {
        Self {
            processed_id: row.processed_id,
            upload_id: row.upload_id,
            processed_file_path: row.processed_file_path,
            proof_data_path: row.proof_data_path,
            error_count: row.error_count,
            processing_time: row.processing_time,
            processed_date: row.processed_date,
        }
    }
}

/// `{"message": "success", "info": [row]}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessedFileInfoDto {
    pub message: String,
    pub info: Vec<ProcessedFileDto>,
}

pub fn format_display_date(date: &DateTime<Utc>) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Whether the multipart part looks like a PDF. Browsers sometimes send
/// `application/octet-stream`, so the extension can stand in for the type;
/// the payload header is always checked.
pub fn is_pdf_upload(content_type: &str, file_name: &str, data: &[u8]) -> bool {
    let declared_pdf = content_type.eq_ignore_ascii_case(PDF_MIME_TYPE)
        || (content_type.eq_ignore_ascii_case("application/octet-stream")
            && file_name.to_ascii_lowercase().ends_with(".pdf"));

    declared_pdf && data.starts_with(PDF_MAGIC)
}
