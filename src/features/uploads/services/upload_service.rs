use std::io;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::uploads::dtos::{
    ProcessedFileDto, RecentFileDto, SubmitProcessedFileDto, UploadResponseDto,
};
use crate::features::uploads::models::{
    NewUpload, OutputKind, ProcessedFile, ProcessingResult, Upload,
};
use crate::features::uploads::repositories::{UploadRepository, UploadTransaction};
use crate::modules::storage::DocumentStore;
use crate::shared::validation::{base_name, is_safe_artifact_name, sanitize_file_stem};

/// Service for uploads and their proofreading records
pub struct UploadService {
    repository: Arc<dyn UploadRepository>,
    store: Arc<dyn DocumentStore>,
    max_upload_size: usize,
}

impl UploadService {
    pub fn new(
        repository: Arc<dyn UploadRepository>,
        store: Arc<dyn DocumentStore>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            repository,
            store,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// `<time-ordered id>_<sanitized stem>.pdf`
    fn storage_name(original_filename: &str) -> String {
        format!(
            "{}_{}.pdf",
            Uuid::now_v7().simple(),
            sanitize_file_stem(original_filename)
        )
    }

    /// Store a validated PDF and create its `uploads` row together with an
    /// empty `processed_files` row.
    ///
    /// The file is written as a temp file first and only renamed into place
    /// while the transaction is still open; a failed rename rolls the rows
    /// back and removes the temp file, so either everything exists or nothing.
    pub async fn upload_pdf(
        &self,
        user: &AuthenticatedUser,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponseDto> {
        let original_filename = base_name(file_name).to_string();
        let custom_name = Self::storage_name(&original_filename);
        let file_size = data.len() as i64;

        self.store
            .write_temp(&custom_name, &data)
            .await
            .map_err(|e| {
                warn!("Failed to write temp upload {}: {}", custom_name, e);
                AppError::Internal("Failed to move uploaded file.".to_string())
            })?;

        let new_upload = NewUpload {
            user_id: user.user_id.clone(),
            original_filename,
            custom_name: custom_name.clone(),
            file_size,
            file_path: self.store.upload_path(&custom_name),
        };

        let mut tx = match self.repository.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.discard_temp(&custom_name).await;
                return Err(e);
            }
        };

        let (upload, processed) = match Self::insert_rows(tx.as_mut(), &new_upload).await {
            Ok(rows) => rows,
            Err(e) => {
                self.abort(tx, &custom_name).await;
                return Err(e);
            }
        };

        if let Err(e) = self.store.promote(&custom_name).await {
            warn!("Failed to finalize upload {}: {}", custom_name, e);
            self.abort(tx, &custom_name).await;
            return Err(AppError::Internal(
                "Failed to finalize file upload.".to_string(),
            ));
        }

        if let Err(e) = tx.commit().await {
            if let Err(io) = self.store.discard(&custom_name).await {
                warn!("Failed to remove orphaned upload {}: {}", custom_name, io);
            }
            return Err(e);
        }

        info!(
            "Upload stored: upload_id={}, processed_id={}, name={}, size={}",
            upload.upload_id, processed.processed_id, upload.custom_name, upload.file_size
        );

        let status = upload.status();
        Ok(UploadResponseDto {
            success: true,
            message: "File uploaded successfully".to_string(),
            upload_id: upload.upload_id,
            custom_name: upload.custom_name,
            file_size: upload.file_size,
            upload_date: upload.upload_date,
            status,
        })
    }

    async fn insert_rows(
        tx: &mut dyn UploadTransaction,
        new_upload: &NewUpload,
    ) -> Result<(Upload, ProcessedFile)> {
        let upload = tx.insert_upload(new_upload).await?;
        let processed = tx.insert_placeholder(upload.upload_id).await?;
        Ok((upload, processed))
    }

    async fn abort(&self, tx: Box<dyn UploadTransaction>, custom_name: &str) {
        if let Err(e) = tx.rollback().await {
            warn!("Rollback failed for upload {}: {}", custom_name, e);
        }
        self.discard_temp(custom_name).await;
    }

    async fn discard_temp(&self, custom_name: &str) {
        if let Err(e) = self.store.discard_temp(custom_name).await {
            warn!("Failed to remove temp upload {}: {}", custom_name, e);
        }
    }

    /// Record results posted by the client once proofreading finished
    pub async fn submit_processed(
        &self,
        user: &AuthenticatedUser,
        dto: SubmitProcessedFileDto,
    ) -> Result<()> {
        let (upload_id, result) = dto
            .into_result()
            .ok_or_else(|| AppError::Validation("Missing required fields".to_string()))?;

        self.record_result(user, upload_id, &result).await
    }

    /// Store a proofreading result on the caller's upload
    pub async fn record_result(
        &self,
        user: &AuthenticatedUser,
        upload_id: i64,
        result: &ProcessingResult,
    ) -> Result<()> {
        for name in [&result.processed_file_path, &result.proof_data_path] {
            if !is_safe_artifact_name(name) {
                return Err(AppError::Validation(format!(
                    "Invalid artifact filename: {}",
                    name
                )));
            }
        }

        let found = self
            .repository
            .record_result(upload_id, &user.user_id, result)
            .await?;

        if !found {
            return Err(AppError::NotFound("Upload not found".to_string()));
        }
        Ok(())
    }

    pub async fn mark_failed(&self, user: &AuthenticatedUser, upload_id: i64) -> Result<()> {
        if !self
            .repository
            .mark_failed(upload_id, &user.user_id)
            .await?
        {
            return Err(AppError::NotFound("Upload not found".to_string()));
        }
        warn!("Upload marked failed: upload_id={}", upload_id);
        Ok(())
    }

    pub async fn find_upload(&self, user: &AuthenticatedUser, upload_id: i64) -> Result<Upload> {
        self.repository
            .find_upload(upload_id, &user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))
    }

    /// The caller's uploads with their processing records, newest first
    pub async fn recent_files(&self, user: &AuthenticatedUser) -> Result<Vec<RecentFileDto>> {
        let rows = self.repository.list_recent(&user.user_id).await?;
        Ok(rows.into_iter().map(RecentFileDto::from).collect())
    }

    pub async fn processed_file(
        &self,
        user: &AuthenticatedUser,
        processed_id: i64,
    ) -> Result<ProcessedFileDto> {
        self.repository
            .find_processed(processed_id, &user.user_id)
            .await?
            .map(ProcessedFileDto::from)
            .ok_or_else(|| AppError::NotFound("Processed file not found".to_string()))
    }

    pub async fn processed_for_upload(
        &self,
        user: &AuthenticatedUser,
        upload_id: i64,
    ) -> Result<ProcessedFile> {
        self.repository
            .find_processed_by_upload(upload_id, &user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))
    }

    /// Contents of a proofreading output file, served only to the owner of
    /// the processed row that names it
    pub async fn output_file(
        &self,
        user: &AuthenticatedUser,
        kind: OutputKind,
        name: &str,
    ) -> Result<Vec<u8>> {
        let not_found = || AppError::NotFound("File not found".to_string());

        if !is_safe_artifact_name(name)
            || !self.repository.owns_output(&user.user_id, kind, name).await?
        {
            return Err(not_found());
        }

        let read = match kind {
            OutputKind::Artifact => self.store.read_artifact(name).await,
            OutputKind::ProofreadPdf => self.store.read_generated(name).await,
        };
        match read {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Output {} recorded but missing on disk", name);
                Err(not_found())
            }
            Err(e) => Err(e.into()),
        }
    }
}
