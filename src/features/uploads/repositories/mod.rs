mod upload_repository;

pub use upload_repository::{PgUploadRepository, UploadRepository, UploadTransaction};
