//! Errors surfaced by [`ImageService`](super::ImageService).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a submission before or while its payload is stored.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file type")]
    InvalidFileType,

    #[error("File exceeds maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to store upload at {path}: {source}")]
    Store {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Upload was cancelled")]
    Cancelled,

    #[error("Failed to prepare directory {path}: {source}")]
    PrepareDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ServiceError {
    /// Whether the submission was turned away before a run was created.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::NoFileSelected | ServiceError::InvalidFileType)
    }
}
