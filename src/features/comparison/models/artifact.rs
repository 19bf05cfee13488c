//! Comparison artifacts written by the proofreading service
//!
//! Two shapes are accepted:
//! - a single artifact `{original_token, proofread_token, original_text, revised_text}`
//! - the full report `{pdf_id, paragraphs: [artifact + paragraph_id]}`
//!
//! Accepted choices are written back with [`apply_accepted`], which edits the
//! raw JSON so fields this crate does not model survive the rewrite.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::selection::AcceptedSuggestion;
use crate::shared::constants::ANNOTATION_TYPE_ERROR;

/// Token as emitted by the service: a bare word or `{"idx": .., "word": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawToken {
    Word(String),
    Entry {
        #[serde(default)]
        word: Option<String>,
    },
}

fn deserialize_tokens<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<RawToken>>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|token| match token {
            Some(RawToken::Word(word)) => word,
            Some(RawToken::Entry { word }) => word.unwrap_or_default(),
            None => String::new(),
        })
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Annotation on an original token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorAnnotation {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ErrorAnnotation {
    pub fn is_error(&self) -> bool {
        self.kind.as_deref() == Some(ANNOTATION_TYPE_ERROR)
    }
}

/// Suggestions offered for a revised token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuggestionAnnotation {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<Option<String>>,
}

impl SuggestionAnnotation {
    /// Non-null suggestions in service order
    pub fn options(&self) -> Vec<String> {
        self.suggestions.iter().flatten().cloned().collect()
    }
}

/// One paragraph's worth of original vs proofread tokens
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComparisonArtifact {
    #[serde(default)]
    pub paragraph_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub original_token: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub proofread_token: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_text: Vec<ErrorAnnotation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub revised_text: Vec<SuggestionAnnotation>,
}

/// A parsed artifact file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonDocument {
    pub pdf_id: Option<String>,
    pub paragraphs: Vec<ComparisonArtifact>,
}

#[derive(Deserialize)]
struct ComparisonReport {
    #[serde(default)]
    pdf_id: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    paragraphs: Vec<ComparisonArtifact>,
}

impl ComparisonDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        if value.get("paragraphs").is_some() {
            let report: ComparisonReport = serde_json::from_value(value)?;
            let pdf_id = report.pdf_id.and_then(|id| match id {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            });
            return Ok(Self {
                pdf_id,
                paragraphs: report.paragraphs,
            });
        }

        let artifact: ComparisonArtifact = serde_json::from_value(value)?;
        Ok(Self {
            pdf_id: None,
            paragraphs: vec![artifact],
        })
    }

    /// Paragraph ids that carry at least one suggestion
    pub fn revised_paragraph_ids(&self) -> Vec<i64> {
        self.paragraphs
            .iter()
            .filter(|p| p.revised_text.iter().any(|a| !a.options().is_empty()))
            .filter_map(|p| p.paragraph_id)
            .collect()
    }
}

/// Write accepted choices into a raw artifact.
///
/// For each choice the proofread token is replaced, the paragraph's
/// `proofread` text is respelled and the chosen word becomes the first
/// suggestion, so the next view and the paragraph rewrite both use it.
/// Choices pointing outside the artifact are skipped.
pub fn apply_accepted(
    raw: &[u8],
    accepted: &[AcceptedSuggestion],
) -> Result<Vec<u8>, serde_json::Error> {
    let mut document: Value = serde_json::from_slice(raw)?;
    let is_report = document.get("paragraphs").is_some();

    for choice in accepted {
        let paragraph = if is_report {
            document
                .get_mut("paragraphs")
                .and_then(Value::as_array_mut)
                .and_then(|paragraphs| paragraphs.get_mut(choice.paragraph))
        } else if choice.paragraph == 0 {
            Some(&mut document)
        } else {
            None
        };

        let applied = paragraph
            .and_then(Value::as_object_mut)
            .map(|fields| apply_choice(fields, choice.index, &choice.word))
            .unwrap_or(false);
        if !applied {
            tracing::warn!(
                "Accepted choice {}-{} has no proofread token",
                choice.paragraph,
                choice.index
            );
        }
    }

    serde_json::to_vec_pretty(&document)
}

fn apply_choice(paragraph: &mut Map<String, Value>, index: usize, word: &str) -> bool {
    let Some(tokens) = paragraph
        .get_mut("proofread_token")
        .and_then(Value::as_array_mut)
    else {
        return false;
    };
    if index >= tokens.len() {
        return false;
    }

    let previous: Vec<String> = tokens.iter().map(|t| token_word(t).to_string()).collect();
    match &mut tokens[index] {
        Value::Object(entry) => {
            entry.insert("word".to_string(), Value::from(word));
        }
        other => *other = Value::from(word),
    }

    let proofread = match paragraph.get("proofread").and_then(Value::as_str) {
        Some(text) => respell(text, &previous, index, word),
        None => join_with(&previous, index, word),
    };
    paragraph.insert("proofread".to_string(), Value::from(proofread));

    if let Some(annotations) = paragraph
        .get_mut("revised_text")
        .and_then(Value::as_array_mut)
    {
        annotations
            .iter_mut()
            .filter(|a| a.get("index").and_then(Value::as_i64) == Some(index as i64))
            .filter_map(Value::as_object_mut)
            .for_each(|annotation| prefer_suggestion(annotation, word));
    }
    true
}

fn token_word(token: &Value) -> &str {
    match token {
        Value::String(word) => word.as_str(),
        Value::Object(entry) => entry.get("word").and_then(Value::as_str).unwrap_or(""),
        _ => "",
    }
}

/// Replace token `index` inside `text`, keeping the original spacing and
/// punctuation. Tokens are located left to right; if one cannot be found the
/// text is rebuilt from the tokens.
fn respell(text: &str, tokens: &[String], index: usize, word: &str) -> String {
    let mut cursor = 0;
    for (position, token) in tokens.iter().enumerate() {
        let Some(offset) = text[cursor..].find(token.as_str()) else {
            break;
        };
        let start = cursor + offset;
        let end = start + token.len();
        if position == index {
            return format!("{}{}{}", &text[..start], word, &text[end..]);
        }
        cursor = end;
    }
    join_with(tokens, index, word)
}

fn join_with(tokens: &[String], index: usize, word: &str) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| if position == index { word } else { token.as_str() })
        .collect::<Vec<_>>()
        .join(" ")
}

fn prefer_suggestion(annotation: &mut Map<String, Value>, word: &str) {
    annotation.insert("word".to_string(), Value::from(word));
    if let Some(suggestions) = annotation
        .get_mut("suggestions")
        .and_then(Value::as_array_mut)
    {
        if let Some(position) = suggestions.iter().position(|s| s.as_str() == Some(word)) {
            let chosen = suggestions.remove(position);
            suggestions.insert(0, chosen);
        }
    }
}
