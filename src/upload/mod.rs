//! Upload staging
//!
//! Validates uploaded documents and writes them to uniquely named temp
//! files inside the upload directory. A staged file is deleted when its
//! [`UploadedPdf`] is dropped.

mod filename;
mod staged;
mod types;

pub use filename::{has_pdf_extension, sanitize_filename, DEFAULT_FILENAME};
pub use staged::UploadedPdf;
pub use types::UploadError;
