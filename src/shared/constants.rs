/// MIME type accepted by the upload endpoint
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Every PDF starts with this header
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Stem used when sanitizing leaves nothing of the original filename
pub const FALLBACK_FILE_STEM: &str = "document";

/// Prefix of in-flight upload files inside the uploads directory
pub const TEMP_FILE_PREFIX: &str = "temp_";

/// Display format for upload dates, e.g. `2025-06-01 03:04:05 pm`
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d %I:%M:%S %P";

/// Annotation type that marks an original token as wrong
pub const ANNOTATION_TYPE_ERROR: &str = "error";

/// Message the processed-file endpoint answers with on success
pub const MESSAGE_SUCCESS: &str = "success";

/// Message used when list-style endpoints fail
pub const MESSAGE_ERROR: &str = "error";
