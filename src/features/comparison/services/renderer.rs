use minijinja::{context, Value};
use serde::Serialize;

use crate::features::comparison::models::{
    ParagraphView, RevisedToken, SlotId, SuggestionPanel,
};
use crate::shared::templates::{render_template, TemplateError};

const ORIGINAL_TEMPLATE: &str = "comparison/original.html";
const REVISED_TEMPLATE: &str = "comparison/revised.html";
const PAGE_TEMPLATE: &str = "comparison/page.html";

/// `<p>` of original tokens, errors wrapped in `<span class="error">`
pub fn render_original(paragraph: &ParagraphView) -> Result<String, TemplateError> {
    let tokens: Vec<Value> = paragraph
        .original
        .iter()
        .map(|token| context! { text => &token.text, error => token.error })
        .collect();

    render_template(ORIGINAL_TEMPLATE, context! { tokens })
}

/// `<p>` of revised tokens reflecting the panel's selections and open dropdown
pub fn render_revised(
    panel: &SuggestionPanel,
    paragraph: &ParagraphView,
) -> Result<String, TemplateError> {
    let tokens: Vec<Value> = paragraph
        .revised
        .iter()
        .map(|token| match token {
            RevisedToken::Plain { text, .. } => context! { kind => "plain", text },
            RevisedToken::Accepted { text, .. } => context! { kind => "accepted", text },
            RevisedToken::Choice { index, options } => {
                let slot = SlotId::new(paragraph.position, *index);
                context! {
                    kind => "choice",
                    slot => slot.to_string(),
                    text => panel.displayed(slot).unwrap_or_else(|| token.default_text()),
                    options,
                    selected => panel.selected_index(slot).unwrap_or(0),
                    open => panel.is_open(slot),
                }
            }
        })
        .collect();

    render_template(REVISED_TEMPLATE, context! { tokens })
}

/// Pre-rendered HTML of one paragraph
#[derive(Debug, Clone, Serialize)]
pub struct RenderedParagraph {
    pub original_html: String,
    pub revised_html: String,
}

pub fn render_paragraphs(panel: &SuggestionPanel) -> Result<Vec<RenderedParagraph>, TemplateError> {
    panel
        .view()
        .paragraphs
        .iter()
        .map(|paragraph| {
            Ok(RenderedParagraph {
                original_html: render_original(paragraph)?,
                revised_html: render_revised(panel, paragraph)?,
            })
        })
        .collect()
}

/// Page header data
pub struct PageInfo<'a> {
    pub upload_id: i64,
    pub title: &'a str,
    pub processed_file: Option<&'a str>,
}

/// Full comparison page with both panes and the selection script
pub fn render_page(info: &PageInfo<'_>, panel: &SuggestionPanel) -> Result<String, TemplateError> {
    let paragraphs = render_paragraphs(panel)?;

    render_template(
        PAGE_TEMPLATE,
        context! {
            upload_id => info.upload_id,
            title => info.title,
            processed_file => info.processed_file,
            accept_all_enabled => panel.accept_all_enabled(),
            paragraphs,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::comparison::models::{ComparisonDocument, DocumentView};

    fn panel(json: &str) -> SuggestionPanel {
        let document = ComparisonDocument::parse(json.as_bytes()).unwrap();
        SuggestionPanel::new(DocumentView::build(&document))
    }

    #[test]
    fn test_original_wraps_only_index_two() {
        let panel = panel(
            r#"{"original_token": ["This", "are", "wrong", "here"], "original_text": [{"index": 2, "type": "error"}]}"#,
        );

        let html = render_original(&panel.view().paragraphs[0]).unwrap();

        assert_eq!(html, r#"<p>This are <span class="error">wrong</span> here</p>"#);
    }

    #[test]
    fn test_revised_dropdown_lists_all_options() {
        let panel = panel(
            r#"{"proofread_token": ["a", "b", "c"], "revised_text": [{"index": 1, "suggestions": ["foo", "bar"]}]}"#,
        );

        let html = render_revised(&panel, &panel.view().paragraphs[0]).unwrap();

        assert_eq!(
            html,
            concat!(
                r#"<p>a <span class="suggestion-container" data-slot="0-1">"#,
                r#"<span class="suggestion-word">foo</span>"#,
                r#"<select class="floating-select" style="display:none;">"#,
                r#"<option value="foo" selected>foo</option>"#,
                r#"<option value="bar">bar</option>"#,
                r#"</select></span> c</p>"#
            )
        );
    }

    #[test]
    fn test_revised_reflects_selection() {
        let mut panel = panel(
            r#"{"proofread_token": ["a", "b"], "revised_text": [{"index": 1, "suggestions": ["foo", "bar"]}]}"#,
        );
        panel.select(SlotId::new(0, 1), "bar").unwrap();

        let html = render_revised(&panel, &panel.view().paragraphs[0]).unwrap();

        assert!(html.contains(r#"<span class="suggestion-word">bar</span>"#));
        assert!(html.contains(r#"<option value="bar" selected>bar</option>"#));
        assert!(html.contains(r#"<option value="foo">foo</option>"#));
    }

    #[test]
    fn test_single_suggestion_is_accepted_span() {
        let panel = panel(
            r#"{"proofread_token": ["x", "y"], "revised_text": [{"index": 0, "suggestions": ["z"]}]}"#,
        );

        let html = render_revised(&panel, &panel.view().paragraphs[0]).unwrap();

        assert_eq!(
            html,
            r#"<p><span class="suggestion-container"><span class="accepted">z</span></span> y</p>"#
        );
    }

    #[test]
    fn test_page_embeds_rendered_paragraphs() {
        let panel = panel(
            r#"{"original_token": ["I", "has"], "proofread_token": ["I", "have"], "original_text": [{"index": 1, "type": "error"}], "revised_text": [{"index": 1, "suggestions": ["have", "had"]}]}"#,
        );

        let html = render_page(
            &PageInfo {
                upload_id: 9,
                title: "essay.pdf",
                processed_file: Some("0197_essay.pdf"),
            },
            &panel,
        )
        .unwrap();

        assert!(html.contains(r#"<span class="error">has</span>"#));
        assert!(html.contains(r#"data-slot="0-1""#));
        assert!(html.contains(r#"href="/generated/0197_essay.pdf""#));
        assert!(html.contains(r#"id="acceptAllBtn" disabled"#));
    }
}
