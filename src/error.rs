//! Error types for pdfsum-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::llm::LlmError;
use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Document processing failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Model request failed: {0}")]
    Model(#[from] LlmError),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upload(e) => e.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            status: "error",
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::from(UploadError::InvalidFileType).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(UploadError::Io(std::io::Error::other("disk full"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(DocumentError::from(OcrError::EngineUnavailable("x".into()))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Timeout(5).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upload_messages_pass_through() {
        assert_eq!(
            AppError::from(UploadError::Missing).to_string(),
            "No file uploaded or content provided"
        );
    }
}
