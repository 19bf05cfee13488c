use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::Utc;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::proofreading::clients::{ProofreadOutcome, Proofreader};
use crate::features::uploads::models::{
    NewUpload, OutputKind, ProcessedFile, ProcessingResult, RecentFileRow, Upload, UploadStatus,
};
use crate::features::uploads::repositories::{UploadRepository, UploadTransaction};
use crate::modules::storage::{DocumentStore, LocalDocumentStore};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";

pub fn test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "7".to_string(),
        full_name: Some("Test User".to_string()),
    }
}

pub fn other_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "8".to_string(),
        full_name: None,
    }
}

/// Puts `user` into request extensions the way the session middleware does
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

/// Local store rooted in a fresh temp directory
pub async fn temp_store() -> (TempDir, Arc<LocalDocumentStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalDocumentStore::new(&StorageConfig {
        uploads_dir: dir.path().join("uploads"),
        json_dir: dir.path().join("json"),
        generated_dir: dir.path().join("generated"),
    });
    store.ensure_dirs().await.unwrap();
    (dir, Arc::new(store))
}

/// Every file name currently in a directory
pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[derive(Default)]
struct Tables {
    uploads: Vec<Upload>,
    processed: Vec<ProcessedFile>,
    next_upload_id: i64,
    next_processed_id: i64,
}

impl Tables {
    fn owned_upload_mut(&mut self, upload_id: i64, user_id: &str) -> Option<&mut Upload> {
        self.uploads
            .iter_mut()
            .find(|u| u.upload_id == upload_id && u.user_id == user_id)
    }

    fn owns(&self, upload_id: i64, user_id: &str) -> bool {
        self.uploads
            .iter()
            .any(|u| u.upload_id == upload_id && u.user_id == user_id)
    }
}

/// Repository double; transaction writes become visible only on commit
#[derive(Clone, Default)]
pub struct InMemoryUploadRepository {
    tables: Arc<Mutex<Tables>>,
    fail_placeholder: bool,
}

impl InMemoryUploadRepository {
    /// Placeholder inserts fail, as if the database rejected them
    pub fn failing_placeholder() -> Self {
        Self {
            fail_placeholder: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.tables.lock().unwrap().uploads.clone()
    }

    pub fn processed(&self) -> Vec<ProcessedFile> {
        self.tables.lock().unwrap().processed.clone()
    }

    /// Committed upload with its placeholder row
    pub async fn seed(&self, user: &AuthenticatedUser, custom_name: &str) -> Upload {
        let mut tx = self.begin().await.unwrap();
        let upload = tx
            .insert_upload(&NewUpload {
                user_id: user.user_id.clone(),
                original_filename: format!("{}.pdf", custom_name),
                custom_name: format!("{}.pdf", custom_name),
                file_size: PDF_BYTES.len() as i64,
                file_path: format!("uploads/{}.pdf", custom_name),
            })
            .await
            .unwrap();
        tx.insert_placeholder(upload.upload_id).await.unwrap();
        tx.commit().await.unwrap();
        upload
    }
}

struct InMemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    uploads: Vec<Upload>,
    processed: Vec<ProcessedFile>,
    fail_placeholder: bool,
}

#[async_trait]
impl UploadTransaction for InMemoryTransaction {
    async fn insert_upload(&mut self, upload: &NewUpload) -> Result<Upload> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_upload_id += 1;

        let row = Upload {
            upload_id: tables.next_upload_id,
            user_id: upload.user_id.clone(),
            original_filename: upload.original_filename.clone(),
            custom_name: upload.custom_name.clone(),
            file_size: upload.file_size,
            file_path: upload.file_path.clone(),
            status: UploadStatus::Pending.as_str().to_string(),
            upload_date: Utc::now(),
        };
        self.uploads.push(row.clone());
        Ok(row)
    }

    async fn insert_placeholder(&mut self, upload_id: i64) -> Result<ProcessedFile> {
        if self.fail_placeholder {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.lock().unwrap();
        tables.next_processed_id += 1;

        let row = ProcessedFile {
            processed_id: tables.next_processed_id,
            upload_id,
            processed_file_path: None,
            proof_data_path: None,
            error_count: 0,
            processing_time: None,
            processed_date: None,
        };
        self.processed.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.uploads.extend(self.uploads);
        tables.processed.extend(self.processed);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UploadRepository for InMemoryUploadRepository {
    async fn begin(&self) -> Result<Box<dyn UploadTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: self.tables.clone(),
            uploads: Vec::new(),
            processed: Vec::new(),
            fail_placeholder: self.fail_placeholder,
        }))
    }

    async fn find_upload(&self, upload_id: i64, user_id: &str) -> Result<Option<Upload>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .uploads
            .iter()
            .find(|u| u.upload_id == upload_id && u.user_id == user_id)
            .cloned())
    }

    async fn record_result(
        &self,
        upload_id: i64,
        user_id: &str,
        result: &ProcessingResult,
    ) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.owns(upload_id, user_id) {
            return Ok(false);
        }

        let now = Utc::now();
        let Some(processed) = tables.processed.iter_mut().find(|p| p.upload_id == upload_id)
        else {
            return Ok(false);
        };
        processed.processed_file_path = Some(result.processed_file_path.clone());
        processed.proof_data_path = Some(result.proof_data_path.clone());
        processed.error_count = result.error_count;
        processed.processing_time = Some(result.processing_time);
        processed.processed_date = Some(now);

        if let Some(upload) = tables.owned_upload_mut(upload_id, user_id) {
            upload.status = UploadStatus::Processed.as_str().to_string();
        }
        Ok(true)
    }

    async fn mark_failed(&self, upload_id: i64, user_id: &str) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.owned_upload_mut(upload_id, user_id) {
            Some(upload) => {
                upload.status = upload.status().after_failure().as_str().to_string();
                true
            }
            None => false,
        })
    }

    async fn list_recent(&self, user_id: &str) -> Result<Vec<RecentFileRow>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<RecentFileRow> = tables
            .uploads
            .iter()
            .filter(|u| u.user_id == user_id)
            .filter_map(|u| {
                let p = tables.processed.iter().find(|p| p.upload_id == u.upload_id)?;
                Some(RecentFileRow {
                    upload_id: u.upload_id,
                    processed_id: p.processed_id,
                    original_filename: u.original_filename.clone(),
                    original_file: u.file_path.clone(),
                    proofread_file: p.processed_file_path.clone(),
                    file_size: u.file_size,
                    upload_date: u.upload_date,
                    json_data: p.proof_data_path.clone(),
                    status: u.status.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| (b.upload_date, b.upload_id).cmp(&(a.upload_date, a.upload_id)));
        Ok(rows)
    }

    async fn find_processed(
        &self,
        processed_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .processed
            .iter()
            .find(|p| p.processed_id == processed_id && tables.owns(p.upload_id, user_id))
            .cloned())
    }

    async fn find_processed_by_upload(
        &self,
        upload_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>> {
        let tables = self.tables.lock().unwrap();
        if !tables.owns(upload_id, user_id) {
            return Ok(None);
        }
        Ok(tables
            .processed
            .iter()
            .find(|p| p.upload_id == upload_id)
            .cloned())
    }

    async fn owns_output(&self, user_id: &str, kind: OutputKind, name: &str) -> Result<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .processed
            .iter()
            .any(|p| {
                let output = match kind {
                    OutputKind::Artifact => p.proof_data_path.as_deref(),
                    OutputKind::ProofreadPdf => p.processed_file_path.as_deref(),
                };
                output == Some(name) && tables.owns(p.upload_id, user_id)
            }))
    }
}

/// Local store whose rename into place always fails
pub struct FailingPromoteStore(pub Arc<LocalDocumentStore>);

#[async_trait]
impl DocumentStore for FailingPromoteStore {
    async fn write_temp(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        self.0.write_temp(name, data).await
    }

    async fn promote(&self, _name: &str) -> io::Result<()> {
        Err(io::Error::other("rename failed"))
    }

    async fn discard_temp(&self, name: &str) -> io::Result<()> {
        self.0.discard_temp(name).await
    }

    async fn discard(&self, name: &str) -> io::Result<()> {
        self.0.discard(name).await
    }

    async fn read_artifact(&self, name: &str) -> io::Result<Vec<u8>> {
        self.0.read_artifact(name).await
    }

    async fn write_artifact(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.0.write_artifact(name, data).await
    }

    async fn read_generated(&self, name: &str) -> io::Result<Vec<u8>> {
        self.0.read_generated(name).await
    }

    fn upload_path(&self, name: &str) -> String {
        self.0.upload_path(name)
    }
}

/// Proofreader double answering with a fixed outcome, or failing when `None`
#[derive(Default)]
pub struct FakeProofreader {
    outcome: Option<ProofreadOutcome>,
    calls: Mutex<Vec<(String, Vec<i64>)>>,
}

impl FakeProofreader {
    pub fn succeeding(outcome: ProofreadOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            calls: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// `(file_code, paragraph_ids)` of every call so far
    pub fn calls(&self) -> Vec<(String, Vec<i64>)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, file_code: &str, paragraph_ids: &[i64]) -> Result<ProofreadOutcome> {
        self.calls
            .lock()
            .unwrap()
            .push((file_code.to_string(), paragraph_ids.to_vec()));
        self.outcome.clone().ok_or_else(|| {
            AppError::ExternalServiceError("Proofreading service returned 500".to_string())
        })
    }
}

#[async_trait]
impl Proofreader for FakeProofreader {
    async fn proofread(&self, file_code: &str) -> Result<ProofreadOutcome> {
        self.answer(file_code, &[])
    }

    async fn apply_paragraphs(
        &self,
        file_code: &str,
        paragraph_ids: &[i64],
    ) -> Result<ProofreadOutcome> {
        self.answer(file_code, paragraph_ids)
    }
}
