//! OCR Types

/// Armenian, Russian and English Tesseract models in one pass
pub const DEFAULT_OCR_LANGUAGES: &str = "hye+rus+eng";

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The engine cannot run at all (binary missing, not executable)
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    /// An embedded image could not be turned into pixels
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The engine ran but failed on this image
    #[error("OCR processing failed: {0}")]
    Processing(String),
}
