//! HTML templates rendered on the server.
//!
//! Templates live in `templates/` at the crate root and are embedded at
//! compile time; names ending in `.html` are auto-escaped.

mod engine;

pub use engine::{render_template, template_exists, TemplateError};
