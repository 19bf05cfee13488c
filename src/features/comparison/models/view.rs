use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use super::artifact::{ComparisonArtifact, ComparisonDocument, ErrorAnnotation, SuggestionAnnotation};

/// Annotation indexes are non-negative token positions; anything else never matches
fn index_map<'a, A>(
    annotations: &'a [A],
    index_of: impl Fn(&A) -> Option<i64>,
) -> HashMap<usize, &'a A> {
    let mut map = HashMap::with_capacity(annotations.len());
    for annotation in annotations {
        if let Some(index) = index_of(annotation).and_then(|i| usize::try_from(i).ok()) {
            map.entry(index).or_insert(annotation);
        }
    }
    map
}

/// Token of the original text
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OriginalToken {
    pub index: usize,
    pub text: String,
    /// Marked as an error by the proofreading service
    pub error: bool,
}

/// Token of the revised text
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RevisedToken {
    /// Unchanged token
    Plain { index: usize, text: String },
    /// Exactly one suggestion, applied as-is
    Accepted { index: usize, text: String },
    /// Several suggestions; the first one is shown until another is picked
    Choice { index: usize, options: Vec<String> },
}

impl RevisedToken {
    fn from_annotation(index: usize, token: &str, annotation: Option<&SuggestionAnnotation>) -> Self {
        let mut options = annotation.map(|a| a.options()).unwrap_or_default();

        match options.len() {
            0 => RevisedToken::Plain {
                index,
                text: token.to_string(),
            },
            1 => RevisedToken::Accepted {
                index,
                text: options.remove(0),
            },
            _ => RevisedToken::Choice { index, options },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            RevisedToken::Plain { index, .. }
            | RevisedToken::Accepted { index, .. }
            | RevisedToken::Choice { index, .. } => *index,
        }
    }

    /// Text shown before any selection is made
    pub fn default_text(&self) -> &str {
        match self {
            RevisedToken::Plain { text, .. } | RevisedToken::Accepted { text, .. } => text,
            RevisedToken::Choice { options, .. } => options.first().map_or("", String::as_str),
        }
    }
}

/// Both token streams of one paragraph
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ParagraphView {
    /// Position of the paragraph within the artifact
    pub position: usize,
    pub paragraph_id: Option<i64>,
    pub original: Vec<OriginalToken>,
    pub revised: Vec<RevisedToken>,
}

impl ParagraphView {
    pub fn build(position: usize, artifact: &ComparisonArtifact) -> Self {
        let errors = index_map(&artifact.original_text, |a: &ErrorAnnotation| a.index);
        let suggestions = index_map(&artifact.revised_text, |a: &SuggestionAnnotation| a.index);

        let original = artifact
            .original_token
            .iter()
            .enumerate()
            .map(|(index, text)| OriginalToken {
                index,
                text: text.clone(),
                error: errors.get(&index).is_some_and(|a| a.is_error()),
            })
            .collect();

        let revised = artifact
            .proofread_token
            .iter()
            .enumerate()
            .map(|(index, token)| {
                RevisedToken::from_annotation(index, token, suggestions.get(&index).copied())
            })
            .collect();

        Self {
            position,
            paragraph_id: artifact.paragraph_id,
            original,
            revised,
        }
    }

    /// Original text as it is read aloud
    pub fn original_speech(&self) -> String {
        self.original
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Rendered-ready view of a whole artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DocumentView {
    pub pdf_id: Option<String>,
    pub paragraphs: Vec<ParagraphView>,
}

impl DocumentView {
    pub fn build(document: &ComparisonDocument) -> Self {
        Self {
            pdf_id: document.pdf_id.clone(),
            paragraphs: document
                .paragraphs
                .iter()
                .enumerate()
                .map(|(position, artifact)| ParagraphView::build(position, artifact))
                .collect(),
        }
    }

    /// Original text of every paragraph, one paragraph per line
    pub fn original_speech(&self) -> String {
        self.paragraphs
            .iter()
            .map(ParagraphView::original_speech)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(json: &str) -> ComparisonArtifact {
        ComparisonDocument::parse(json.as_bytes())
            .unwrap()
            .paragraphs
            .remove(0)
    }

    #[test]
    fn test_only_annotated_error_is_wrapped() {
        let view = ParagraphView::build(
            0,
            &artifact(
                r#"{"original_token": ["a", "b", "c", "d"], "original_text": [{"index": 2, "type": "error"}]}"#,
            ),
        );

        let flags: Vec<bool> = view.original.iter().map(|t| t.error).collect();
        assert_eq!(flags, vec![false, false, true, false]);
        assert_eq!(view.original_speech(), "a b c d");
    }

    #[test]
    fn test_non_error_annotation_is_verbatim() {
        let view = ParagraphView::build(
            0,
            &artifact(
                r#"{"original_token": ["a", "b"], "original_text": [{"index": 0, "type": "inserted"}, {"index": -1, "type": "error"}, {"index": 7, "type": "error"}]}"#,
            ),
        );

        assert!(view.original.iter().all(|t| !t.error));
    }

    #[test]
    fn test_first_annotation_wins_for_repeated_index() {
        let view = ParagraphView::build(
            0,
            &artifact(
                r#"{"proofread_token": ["x", "y"], "revised_text": [{"index": 1, "suggestions": ["first"]}, {"index": 1, "suggestions": ["second", "third"]}]}"#,
            ),
        );

        assert_eq!(
            view.revised[1],
            RevisedToken::Accepted {
                index: 1,
                text: "first".to_string()
            }
        );
    }

    #[test]
    fn test_revised_token_kinds() {
        let view = ParagraphView::build(
            0,
            &artifact(
                r#"{
                    "proofread_token": ["keep", "one", "many", "empty"],
                    "revised_text": [
                        {"index": 1, "suggestions": ["single"]},
                        {"index": 2, "suggestions": ["foo", "bar"]},
                        {"index": 3, "suggestions": []}
                    ]
                }"#,
            ),
        );

        assert_eq!(
            view.revised,
            vec![
                RevisedToken::Plain {
                    index: 0,
                    text: "keep".to_string()
                },
                RevisedToken::Accepted {
                    index: 1,
                    text: "single".to_string()
                },
                RevisedToken::Choice {
                    index: 2,
                    options: vec!["foo".to_string(), "bar".to_string()]
                },
                RevisedToken::Plain {
                    index: 3,
                    text: "empty".to_string()
                },
            ]
        );
        assert_eq!(view.revised[2].default_text(), "foo");
    }

    #[test]
    fn test_document_speech_joins_paragraphs() {
        let document = ComparisonDocument::parse(
            br#"{"paragraphs": [{"original_token": ["One", "two."]}, {"original_token": ["Three."]}]}"#,
        )
        .unwrap();

        let view = DocumentView::build(&document);
        assert_eq!(view.paragraphs[1].position, 1);
        assert_eq!(view.original_speech(), "One two.\nThree.");
    }
}
