//! Document records
//!
//! Typed intermediate records shared by the extraction passes:
//! per-page text spans, embedded images and their OCR output.

mod error;
mod types;

pub use error::{DocumentError, DocumentResult};
pub use types::{ColorSpace, ExtractedTextSpan, ImageEncoding, ImageOcrResult, PageImage};
