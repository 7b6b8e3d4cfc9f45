//! Upload error types

use axum::http::StatusCode;
use thiserror::Error;

/// Upload validation and staging errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No selected file")]
    EmptyFilename,

    #[error("Invalid file type. Only PDFs are allowed.")]
    InvalidFileType,

    #[error("Invalid base64 content: {0}")]
    InvalidBase64(String),

    #[error("No file uploaded or content provided")]
    Missing,

    #[error("File too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
