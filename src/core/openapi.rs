use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::model::AuthenticatedUser;
use crate::features::comparison::{
    dtos as comparison_dtos, handlers as comparison_handlers, models as comparison_models,
};
use crate::features::proofreading::{
    dtos as proofreading_dtos, handlers as proofreading_handlers,
};
use crate::features::uploads::{
    dtos as uploads_dtos, handlers as uploads_handlers, models as uploads_models,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Uploads
        uploads_handlers::upload_file,
        uploads_handlers::submit_processed_file,
        uploads_handlers::get_recent_files,
        uploads_handlers::get_processed_file,
        uploads_handlers::get_artifact_file,
        uploads_handlers::get_generated_file,
        // Proofreading
        proofreading_handlers::proofread_upload,
        // Comparison
        comparison_handlers::get_comparison,
        comparison_handlers::comparison_page,
        comparison_handlers::accept_suggestions,
    ),
    components(
        schemas(
            AuthenticatedUser,
            // Uploads
            uploads_models::UploadStatus,
            uploads_dtos::UploadPdfDto,
            uploads_dtos::UploadResponseDto,
            uploads_dtos::SubmitProcessedFileDto,
            uploads_dtos::MessageResponseDto,
            uploads_dtos::RecentFileDto,
            uploads_dtos::RecentFilesResponseDto,
            uploads_dtos::ProcessedFileDto,
            uploads_dtos::ProcessedFileInfoDto,
            // Proofreading
            proofreading_dtos::ProofreadInfoDto,
            proofreading_dtos::ProofreadResponseDto,
            // Comparison
            comparison_models::OriginalToken,
            comparison_models::RevisedToken,
            comparison_models::AcceptedSuggestion,
            comparison_dtos::ComparisonParagraphDto,
            comparison_dtos::ComparisonDto,
            comparison_dtos::SelectionDto,
            comparison_dtos::AcceptSuggestionsDto,
            comparison_dtos::AcceptSuggestionsResponseDto,
        )
    ),
    tags(
        (name = "uploads", description = "PDF uploads and their proofreading records"),
        (name = "proofreading", description = "Server-driven runs of the grammar-check service"),
        (name = "comparison", description = "Original vs proofread text with suggestions"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Proofdesk API",
        version = "0.1.0",
        description = "API documentation for Proofdesk",
    )
)]
pub struct ApiDoc;

/// Adds the session JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token; the session cookie is accepted as well",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/submit_upload_files",
            "/api/submit_processed_files",
            "/api/get_recent_files",
            "/api/processed_files/{processed_id}",
            "/json/{name}",
            "/generated/{name}",
            "/api/uploads/{upload_id}/proofread",
            "/api/comparison/{upload_id}",
            "/api/comparison/{upload_id}/accept",
            "/comparison/{upload_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("session"));
    }
}
