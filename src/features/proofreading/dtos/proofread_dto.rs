use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::uploads::models::UploadStatus;

/// Result of a server-driven proofreading run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProofreadInfoDto {
    pub upload_id: i64,
    pub json_filename: String,
    pub final_pdf_filename: String,
    pub total_improvements: i64,
    pub elapsed_time_seconds: f64,
    pub status: UploadStatus,
}

/// `{"message": "success", "info": {...}}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProofreadResponseDto {
    pub message: String,
    pub info: ProofreadInfoDto,
}
