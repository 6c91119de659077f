use tether_core::{ErrorMetadata, FilesError, LogLevel};
use tether_storage::DiskError;

/// Error returned by attachment operations
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Files(#[from] FilesError),

    #[error(transparent)]
    Disk(#[from] DiskError),
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;

impl AttachmentError {
    pub fn is_model_not_persisted(&self) -> bool {
        matches!(self, AttachmentError::Files(FilesError::ModelNotPersisted))
    }
}

fn disk_error_metadata(err: &DiskError) -> (&'static str, bool, LogLevel) {
    match err {
        DiskError::NotFound(_) => ("FILE_NOT_FOUND", false, LogLevel::Debug),
        DiskError::InvalidKey(_) => ("INVALID_STORAGE_KEY", false, LogLevel::Debug),
        DiskError::UnknownDisk(_) | DiskError::ConfigError(_) => {
            ("CONFIGURATION_ERROR", false, LogLevel::Error)
        }
        DiskError::Unsupported { .. } => ("UNSUPPORTED_OPERATION", false, LogLevel::Warn),
        DiskError::UploadFailed(_)
        | DiskError::DownloadFailed(_)
        | DiskError::DeleteFailed(_)
        | DiskError::BackendError(_) => ("STORAGE_ERROR", true, LogLevel::Error),
        DiskError::IoError(_) => ("IO_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AttachmentError {
    fn error_code(&self) -> &'static str {
        match self {
            AttachmentError::Files(err) => err.error_code(),
            AttachmentError::Disk(err) => disk_error_metadata(err).0,
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            AttachmentError::Files(err) => err.is_recoverable(),
            AttachmentError::Disk(err) => disk_error_metadata(err).1,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AttachmentError::Files(err) => err.log_level(),
            AttachmentError::Disk(err) => disk_error_metadata(err).2,
        }
    }
}
