use minijinja::Environment;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Embedded templates as (name, source)
const TEMPLATES: &[(&str, &str)] = &[
    (
        "comparison/original.html",
        include_str!("../../../templates/comparison/original.html"),
    ),
    (
        "comparison/revised.html",
        include_str!("../../../templates/comparison/revised.html"),
    ),
    (
        "comparison/page.html",
        include_str!("../../../templates/comparison/page.html"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        } else {
            tracing::debug!("Loaded template: {}", name);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template with any serializable context.
///
/// # Example
/// ```ignore
/// let html = render_template("comparison/original.html", minijinja::context! { tokens })?;
/// ```
pub fn render_template<S: Serialize>(template_name: &str, ctx: S) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

/// Check if a template exists
pub fn template_exists(template_name: &str) -> bool {
    get_environment().get_template(template_name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_missing_template() {
        let result = render_template("nonexistent.html", context! {});
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
        assert!(!template_exists("definitely_not_a_real_template.html"));
    }

    #[test]
    fn test_embedded_templates_load() {
        for (name, _) in TEMPLATES {
            assert!(template_exists(name), "{} failed to load", name);
        }
    }

    #[test]
    fn test_html_templates_escape_tokens() {
        let html = render_template(
            "comparison/original.html",
            context! { tokens => vec![context! { text => "<b>", error => false }] },
        )
        .unwrap();

        assert_eq!(html, "<p>&lt;b&gt;</p>");
    }
}
