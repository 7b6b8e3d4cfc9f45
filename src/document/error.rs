//! Document error types

use thiserror::Error;

use crate::ocr::OcrError;

/// Errors raised while turning a PDF into merged text
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File is not an openable PDF
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// OCR engine cannot run at all
    #[error("OCR engine error: {0}")]
    OcrEngine(#[from] OcrError),

    /// Blocking worker panicked or was cancelled
    #[error("Worker error: {0}")]
    Worker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Parse(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::Parse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocumentError::Worker(format!("Task join error: {}", err))
    }
}
