//! Reading-order extraction
//!
//! Runs the text layer and image passes over a PDF, OCRs the images on a
//! bounded worker pool and splices the OCR text into the page text.

pub mod merger;
mod pipeline;

pub use merger::merge_reading_order;
pub use pipeline::{Extractor, ExtractorConfig};
