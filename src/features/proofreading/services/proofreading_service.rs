use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::proofreading::clients::Proofreader;
use crate::features::proofreading::dtos::ProofreadInfoDto;
use crate::features::uploads::models::{ProcessingResult, UploadStatus};
use crate::features::uploads::UploadService;

/// Drives the external proofreading service for stored uploads
pub struct ProofreadingService {
    uploads: Arc<UploadService>,
    proofreader: Option<Arc<dyn Proofreader>>,
}

impl ProofreadingService {
    pub fn new(uploads: Arc<UploadService>, proofreader: Option<Arc<dyn Proofreader>>) -> Self {
        Self {
            uploads,
            proofreader,
        }
    }

    /// Proofread the caller's upload and record the outcome.
    ///
    /// A failed run moves a pending upload to `failed` and a later run may
    /// still move it to `processed`. Uploads with recorded results stay
    /// `processed` when a re-run fails.
    pub async fn proofread_upload(
        &self,
        user: &AuthenticatedUser,
        upload_id: i64,
    ) -> Result<ProofreadInfoDto> {
        let proofreader = self.proofreader.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("Proofreading service is not configured".to_string())
        })?;

        let upload = self.uploads.find_upload(user, upload_id).await?;
        info!(
            "Proofreading upload_id={} (file_code={})",
            upload.upload_id,
            upload.file_code()
        );

        let outcome = match proofreader.proofread(upload.file_code()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail(user, upload_id).await;
                return Err(e);
            }
        };

        let error_count = match i32::try_from(outcome.total_improvements) {
            Ok(count) if count >= 0 => count,
            _ => {
                self.fail(user, upload_id).await;
                return Err(AppError::ExternalServiceError(format!(
                    "Proofreading service returned an invalid improvement count: {}",
                    outcome.total_improvements
                )));
            }
        };

        let result = ProcessingResult {
            processed_file_path: outcome.final_pdf_filename.clone(),
            proof_data_path: outcome.json_filename.clone(),
            error_count,
            processing_time: outcome.elapsed_time_seconds,
        };
        self.uploads.record_result(user, upload_id, &result).await?;

        Ok(ProofreadInfoDto {
            upload_id,
            json_filename: outcome.json_filename,
            final_pdf_filename: outcome.final_pdf_filename,
            total_improvements: outcome.total_improvements,
            elapsed_time_seconds: outcome.elapsed_time_seconds,
            status: UploadStatus::Processed,
        })
    }

    async fn fail(&self, user: &AuthenticatedUser, upload_id: i64) {
        if let Err(e) = self.uploads.mark_failed(user, upload_id).await {
            warn!("Could not mark upload_id={} failed: {}", upload_id, e);
        }
    }
}
