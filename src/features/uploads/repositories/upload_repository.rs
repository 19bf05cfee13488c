use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use crate::core::error::Result;
use crate::features::uploads::models::{
    NewUpload, OutputKind, ProcessedFile, ProcessingResult, RecentFileRow, Upload, UploadStatus,
};

/// Persistence for `uploads` and `processed_files`.
///
/// Every lookup is scoped by `user_id`; a row owned by someone else is
/// indistinguishable from a missing one.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    /// Open a transaction for creating an upload and its placeholder row
    async fn begin(&self) -> Result<Box<dyn UploadTransaction>>;

    async fn find_upload(&self, upload_id: i64, user_id: &str) -> Result<Option<Upload>>;

    /// Store results on the upload's `processed_files` row and mark the
    /// upload processed, in one transaction. `false` when no such upload.
    async fn record_result(
        &self,
        upload_id: i64,
        user_id: &str,
        result: &ProcessingResult,
    ) -> Result<bool>;

    /// Record a failed run; an already processed upload keeps its status.
    /// `false` when no such upload.
    async fn mark_failed(&self, upload_id: i64, user_id: &str) -> Result<bool>;

    /// Uploads joined with their processed rows, newest first
    async fn list_recent(&self, user_id: &str) -> Result<Vec<RecentFileRow>>;

    async fn find_processed(
        &self,
        processed_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>>;

    async fn find_processed_by_upload(
        &self,
        upload_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>>;

    /// Whether one of the caller's processed rows names this output file
    async fn owns_output(&self, user_id: &str, kind: OutputKind, name: &str) -> Result<bool>;
}

/// Writes of the upload creation step. Dropping without commit rolls back.
#[async_trait]
pub trait UploadTransaction: Send {
    async fn insert_upload(&mut self, upload: &NewUpload) -> Result<Upload>;

    async fn insert_placeholder(&mut self, upload_id: i64) -> Result<ProcessedFile>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Postgres-backed repository
pub struct PgUploadRepository {
    pool: PgPool,
}

impl PgUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PgUploadTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UploadTransaction for PgUploadTransaction {
    async fn insert_upload(&mut self, upload: &NewUpload) -> Result<Upload> {
        let row = sqlx::query_as::<_, Upload>(
            r#"
            INSERT INTO uploads (user_id, original_filename, custom_name, file_size, file_path, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING upload_id, user_id, original_filename, custom_name, file_size, file_path,
                      status, upload_date
            "#,
        )
        .bind(&upload.user_id)
        .bind(&upload.original_filename)
        .bind(&upload.custom_name)
        .bind(upload.file_size)
        .bind(&upload.file_path)
        .bind(UploadStatus::Pending.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        debug!("Upload row inserted: id={}", row.upload_id);
        Ok(row)
    }

    async fn insert_placeholder(&mut self, upload_id: i64) -> Result<ProcessedFile> {
        let row = sqlx::query_as::<_, ProcessedFile>(
            r#"
            INSERT INTO processed_files (upload_id)
            VALUES ($1)
            RETURNING processed_id, upload_id, processed_file_path, proof_data_path,
                      error_count, processing_time, processed_date
            "#,
        )
        .bind(upload_id)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(
            "Processed placeholder inserted: id={}, upload_id={}",
            row.processed_id, upload_id
        );
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    async fn begin(&self) -> Result<Box<dyn UploadTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUploadTransaction { tx }))
    }

    async fn find_upload(&self, upload_id: i64, user_id: &str) -> Result<Option<Upload>> {
        let upload = sqlx::query_as::<_, Upload>(
            r#"
            SELECT upload_id, user_id, original_filename, custom_name, file_size, file_path,
                   status, upload_date
            FROM uploads
            WHERE upload_id = $1 AND user_id = $2
            "#,
        )
        .bind(upload_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(upload)
    }

    async fn record_result(
        &self,
        upload_id: i64,
        user_id: &str,
        result: &ProcessingResult,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE processed_files p
            SET processed_file_path = $1,
                proof_data_path = $2,
                error_count = $3,
                processing_time = $4,
                processed_date = NOW()
            FROM uploads u
            WHERE p.upload_id = u.upload_id
              AND u.upload_id = $5
              AND u.user_id = $6
            "#,
        )
        .bind(&result.processed_file_path)
        .bind(&result.proof_data_path)
        .bind(result.error_count)
        .bind(result.processing_time)
        .bind(upload_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE uploads
            SET processed_date = NOW(), status = $1
            WHERE upload_id = $2
            "#,
        )
        .bind(UploadStatus::Processed.as_str())
        .bind(upload_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Processing result recorded: upload_id={}, errors={}, time={}s",
            upload_id, result.error_count, result.processing_time
        );
        Ok(true)
    }

    async fn mark_failed(&self, upload_id: i64, user_id: &str) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE uploads
            SET status = CASE WHEN status = $1 THEN status ELSE $2 END
            WHERE upload_id = $3 AND user_id = $4
            "#,
        )
        .bind(UploadStatus::Processed.as_str())
        .bind(UploadStatus::Failed.as_str())
        .bind(upload_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn list_recent(&self, user_id: &str) -> Result<Vec<RecentFileRow>> {
        let rows = sqlx::query_as::<_, RecentFileRow>(
            r#"
            SELECT
                a.upload_id,
                b.processed_id,
                a.original_filename,
                a.file_path AS original_file,
                b.processed_file_path AS proofread_file,
                a.file_size,
                a.upload_date,
                b.proof_data_path AS json_data,
                a.status
            FROM uploads a
            INNER JOIN processed_files b ON a.upload_id = b.upload_id
            WHERE a.user_id = $1
            ORDER BY a.upload_date DESC, a.upload_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_processed(
        &self,
        processed_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>> {
        let row = sqlx::query_as::<_, ProcessedFile>(
            r#"
            SELECT p.processed_id, p.upload_id, p.processed_file_path, p.proof_data_path,
                   p.error_count, p.processing_time, p.processed_date
            FROM processed_files p
            INNER JOIN uploads u ON u.upload_id = p.upload_id
            WHERE p.processed_id = $1 AND u.user_id = $2
            "#,
        )
        .bind(processed_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_processed_by_upload(
        &self,
        upload_id: i64,
        user_id: &str,
    ) -> Result<Option<ProcessedFile>> {
        let row = sqlx::query_as::<_, ProcessedFile>(
            r#"
            SELECT p.processed_id, p.upload_id, p.processed_file_path, p.proof_data_path,
                   p.error_count, p.processing_time, p.processed_date
            FROM processed_files p
            INNER JOIN uploads u ON u.upload_id = p.upload_id
            WHERE p.upload_id = $1 AND u.user_id = $2
            "#,
        )
        .bind(upload_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn owns_output(&self, user_id: &str, kind: OutputKind, name: &str) -> Result<bool> {
        let query = format!(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM processed_files p
                INNER JOIN uploads u ON u.upload_id = p.upload_id
                WHERE u.user_id = $1 AND p.{} = $2
            )
            "#,
            kind.column()
        );

        let owned: bool = sqlx::query_scalar(&query)
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(owned)
    }
}
