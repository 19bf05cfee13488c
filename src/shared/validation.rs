use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::FALLBACK_FILE_STEM;

lazy_static! {
    /// Characters kept in a stored filename stem
    /// - Kept: ASCII letters, digits, `_` and `-`
    /// - Dropped: spaces, dots, slashes, accents, everything else
    pub static ref FILE_STEM_STRIP_REGEX: Regex = Regex::new(r"[^a-zA-Z0-9_\-]").unwrap();

    /// Artifact names the proofreading service hands back (`report.json`, `abc_1.pdf`)
    /// - Valid: "reports.json", "66a1_paper.pdf"
    /// - Invalid: "../etc/passwd", "a/b.json", ".hidden"
    pub static ref ARTIFACT_NAME_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_\-.]*$").unwrap();
}

/// Final path component of a client-supplied filename. Both separators are
/// honored since browsers on Windows may send full paths.
pub fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Basename without extension, stripped down to `[A-Za-z0-9_-]`.
pub fn sanitize_file_stem(filename: &str) -> String {
    let base = base_name(filename);
    let stem = match base.rfind('.') {
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    };

    let cleaned = FILE_STEM_STRIP_REGEX.replace_all(stem, "");
    if cleaned.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Whether `name` is a bare file name safe to join onto a storage directory
pub fn is_safe_artifact_name(name: &str) -> bool {
    ARTIFACT_NAME_REGEX.is_match(name) && !name.contains("..")
}
