use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::comparison::models::{AcceptedSuggestion, OriginalToken, RevisedToken, SlotId};

/// One paragraph of the comparison
#[derive(Debug, Serialize, ToSchema)]
pub struct ComparisonParagraphDto {
    pub paragraph_id: Option<i64>,
    pub original: Vec<OriginalToken>,
    pub revised: Vec<RevisedToken>,
    /// Original pane markup
    pub original_html: String,
    /// Revised pane markup with suggestion dropdowns
    pub revised_html: String,
}

/// Side-by-side comparison of an upload's original and proofread text
#[derive(Debug, Serialize, ToSchema)]
pub struct ComparisonDto {
    pub upload_id: i64,
    pub original_filename: String,
    /// Proofread PDF under `/generated/`
    pub processed_file: Option<String>,
    pub error_count: i32,
    pub pdf_id: Option<String>,
    pub paragraphs: Vec<ComparisonParagraphDto>,
    /// Original text for text-to-speech
    pub original_speech: String,
    /// Revised text (first suggestions) for text-to-speech
    pub revised_speech: String,
}

/// A word picked from a suggestion dropdown
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SelectionDto {
    pub paragraph: usize,
    pub index: usize,
    #[validate(length(min = 1))]
    pub word: String,
}

impl SelectionDto {
    pub fn slot(&self) -> SlotId {
        SlotId::new(self.paragraph, self.index)
    }
}

/// Body of an accept-all request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AcceptSuggestionsDto {
    #[validate(length(min = 1, message = "No suggestion has been selected"), nested)]
    pub selections: Vec<SelectionDto>,
}

/// Result of an accept-all request
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptSuggestionsResponseDto {
    pub message: String,
    pub accepted: Vec<AcceptedSuggestion>,
    /// Paragraphs rewritten in the proofread PDF, when the proofreading
    /// service is configured
    pub updated_paragraphs: Option<i64>,
}
