//! OCR Module
//!
//! Optical character recognition for images embedded in PDFs.
//!
//! The default engine shells out to the Tesseract CLI with all three
//! scripts loaded at once (`hye+rus+eng`), since the document language is
//! not known ahead of time.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdfsum_server::ocr::{OcrEngine, TesseractEngine};
//!
//! let engine = TesseractEngine::new("tesseract");
//! if engine.is_available().await {
//!     let text = engine.recognize(&png_bytes, "hye+rus+eng").await?;
//! }
//! ```

mod provider;
mod types;

pub use provider::{OcrEngine, TesseractEngine};
pub use types::{OcrError, DEFAULT_OCR_LANGUAGES};

#[cfg(test)]
pub(crate) use provider::MockEngine;
