use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle of an upload's proofreading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Stored, waiting for proofreading results
    Pending,
    /// Results recorded in `processed_files`
    Processed,
    /// The proofreading service failed for this upload
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processed => "processed",
            UploadStatus::Failed => "failed",
        }
    }

    /// Status after a failed proofreading run; recorded results stay usable
    pub fn after_failure(self) -> Self {
        match self {
            UploadStatus::Processed => UploadStatus::Processed,
            UploadStatus::Pending | UploadStatus::Failed => UploadStatus::Failed,
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "processed" => UploadStatus::Processed,
            "failed" => UploadStatus::Failed,
            _ => UploadStatus::Pending,
        }
    }
}

/// Database model for `uploads`
#[derive(Debug, Clone, FromRow)]
pub struct Upload {
    pub upload_id: i64,
    pub user_id: String,
    pub original_filename: String,
    pub custom_name: String,
    pub file_size: i64,
    pub file_path: String,
    pub status: String,
    pub upload_date: DateTime<Utc>,
}

impl Upload {
    pub fn status(&self) -> UploadStatus {
        UploadStatus::from_db(&self.status)
    }

    /// Code the proofreading service knows this document by (stored name minus `.pdf`)
    pub fn file_code(&self) -> &str {
        self.custom_name
            .strip_suffix(".pdf")
            .unwrap_or(&self.custom_name)
    }
}

/// Database model for `processed_files`; result columns stay empty until
/// proofreading results are recorded.
#[derive(Debug, Clone, FromRow)]
pub struct ProcessedFile {
    pub processed_id: i64,
    pub upload_id: i64,
    pub processed_file_path: Option<String>,
    pub proof_data_path: Option<String>,
    pub error_count: i32,
    pub processing_time: Option<f64>,
    pub processed_date: Option<DateTime<Utc>>,
}

/// Row of the `uploads ⋈ processed_files` listing
#[derive(Debug, Clone, FromRow)]
pub struct RecentFileRow {
    pub upload_id: i64,
    pub processed_id: i64,
    pub original_filename: String,
    pub original_file: String,
    pub proofread_file: Option<String>,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub json_data: Option<String>,
    pub status: String,
}

/// Values for a fresh `uploads` row
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub user_id: String,
    pub original_filename: String,
    pub custom_name: String,
    pub file_size: i64,
    pub file_path: String,
}

/// Files the proofreading service leaves behind for a processed upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Comparison artifact under the json directory
    Artifact,
    /// Proofread PDF under the generated directory
    ProofreadPdf,
}

impl OutputKind {
    /// `processed_files` column naming this output
    pub fn column(&self) -> &'static str {
        match self {
            OutputKind::Artifact => "proof_data_path",
            OutputKind::ProofreadPdf => "processed_file_path",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputKind::Artifact => "application/json",
            OutputKind::ProofreadPdf => "application/pdf",
        }
    }
}

/// Finalized output of one proofreading run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub processed_file_path: String,
    pub proof_data_path: String,
    pub error_count: i32,
    pub processing_time: f64,
}
