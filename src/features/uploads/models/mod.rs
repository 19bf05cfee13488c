mod upload;

pub use upload::{
    NewUpload, OutputKind, ProcessedFile, ProcessingResult, RecentFileRow, Upload, UploadStatus,
};
