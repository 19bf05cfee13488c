use std::io;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::comparison::dtos::{
    AcceptSuggestionsDto, AcceptSuggestionsResponseDto, ComparisonDto, ComparisonParagraphDto,
};
use crate::features::comparison::models::{
    apply_accepted, ComparisonDocument, DocumentView, SuggestionPanel,
};
use crate::features::comparison::services::renderer::{self, PageInfo};
use crate::features::proofreading::Proofreader;
use crate::features::uploads::models::{ProcessedFile, Upload};
use crate::features::uploads::UploadService;
use crate::modules::storage::DocumentStore;
use crate::shared::constants::MESSAGE_SUCCESS;
use crate::shared::validation::is_safe_artifact_name;

/// Loaded comparison for one upload
struct Loaded {
    upload: Upload,
    processed: ProcessedFile,
    artifact: String,
    raw: Vec<u8>,
    document: ComparisonDocument,
}

/// Builds comparison views from stored artifacts
pub struct ComparisonService {
    uploads: Arc<UploadService>,
    store: Arc<dyn DocumentStore>,
    proofreader: Option<Arc<dyn Proofreader>>,
}

impl ComparisonService {
    pub fn new(
        uploads: Arc<UploadService>,
        store: Arc<dyn DocumentStore>,
        proofreader: Option<Arc<dyn Proofreader>>,
    ) -> Self {
        Self {
            uploads,
            store,
            proofreader,
        }
    }

    async fn load(&self, user: &AuthenticatedUser, upload_id: i64) -> Result<Loaded> {
        let upload = self.uploads.find_upload(user, upload_id).await?;
        let processed = self.uploads.processed_for_upload(user, upload_id).await?;

        let artifact = processed.proof_data_path.clone().ok_or_else(|| {
            AppError::Conflict("Upload has not been proofread yet".to_string())
        })?;

        if !is_safe_artifact_name(&artifact) {
            return Err(AppError::Internal(format!(
                "Stored artifact name is not a plain filename: {}",
                artifact
            )));
        }

        let raw = match self.store.read_artifact(&artifact).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Artifact {} missing for upload_id={}", artifact, upload_id);
                return Err(AppError::NotFound("Comparison data not found".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let document = ComparisonDocument::parse(&raw).map_err(|e| {
            AppError::Internal(format!("Comparison data {} is malformed: {}", artifact, e))
        })?;

        Ok(Loaded {
            upload,
            processed,
            artifact,
            raw,
            document,
        })
    }

    /// Token streams, markup and speech text for the caller's upload
    pub async fn comparison(
        &self,
        user: &AuthenticatedUser,
        upload_id: i64,
    ) -> Result<ComparisonDto> {
        let loaded = self.load(user, upload_id).await?;
        let panel = SuggestionPanel::new(DocumentView::build(&loaded.document));
        let rendered = renderer::render_paragraphs(&panel)?;

        let view = panel.view();
        let paragraphs = view
            .paragraphs
            .iter()
            .zip(rendered)
            .map(|(paragraph, html)| ComparisonParagraphDto {
                paragraph_id: paragraph.paragraph_id,
                original: paragraph.original.clone(),
                revised: paragraph.revised.clone(),
                original_html: html.original_html,
                revised_html: html.revised_html,
            })
            .collect();

        Ok(ComparisonDto {
            upload_id: loaded.upload.upload_id,
            original_filename: loaded.upload.original_filename,
            processed_file: loaded.processed.processed_file_path,
            error_count: loaded.processed.error_count,
            pdf_id: view.pdf_id.clone(),
            paragraphs,
            original_speech: view.original_speech(),
            revised_speech: panel.revised_speech(),
        })
    }

    /// Full HTML comparison page
    pub async fn comparison_page(&self, user: &AuthenticatedUser, upload_id: i64) -> Result<String> {
        let loaded = self.load(user, upload_id).await?;
        let panel = SuggestionPanel::new(DocumentView::build(&loaded.document));

        let html = renderer::render_page(
            &PageInfo {
                upload_id: loaded.upload.upload_id,
                title: &loaded.upload.original_filename,
                processed_file: loaded.processed.processed_file_path.as_deref(),
            },
            &panel,
        )?;
        Ok(html)
    }

    /// Apply the caller's dropdown selections and accept every suggestion.
    ///
    /// The chosen words are written into the stored artifact first. When the
    /// proofreading service is configured it then rewrites the paragraphs
    /// carrying suggestions in the proofread PDF from that artifact.
    pub async fn accept(
        &self,
        user: &AuthenticatedUser,
        upload_id: i64,
        dto: AcceptSuggestionsDto,
    ) -> Result<AcceptSuggestionsResponseDto> {
        let loaded = self.load(user, upload_id).await?;
        let mut panel = SuggestionPanel::new(DocumentView::build(&loaded.document));

        for selection in &dto.selections {
            panel
                .select(selection.slot(), &selection.word)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }
        let accepted = panel
            .accept_all()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let rewritten = apply_accepted(&loaded.raw, &accepted).map_err(|e| {
            AppError::Internal(format!(
                "Comparison data {} could not be rewritten: {}",
                loaded.artifact, e
            ))
        })?;
        self.store
            .write_artifact(&loaded.artifact, &rewritten)
            .await?;

        let paragraph_ids = loaded.document.revised_paragraph_ids();
        let updated_paragraphs = match &self.proofreader {
            Some(proofreader) if !paragraph_ids.is_empty() => {
                let outcome = proofreader
                    .apply_paragraphs(loaded.upload.file_code(), &paragraph_ids)
                    .await?;
                Some(outcome.total_improvements)
            }
            _ => None,
        };

        info!(
            "Suggestions accepted: upload_id={}, selections={}, paragraphs_updated={:?}",
            upload_id,
            accepted.len(),
            updated_paragraphs
        );

        Ok(AcceptSuggestionsResponseDto {
            message: MESSAGE_SUCCESS.to_string(),
            accepted,
            updated_paragraphs,
        })
    }
}
