//! Staged upload files

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::filename::sanitize_filename;
use super::types::UploadError;

/// An uploaded PDF written to disk
///
/// The backing file is removed when this value is dropped.
#[derive(Debug)]
pub struct UploadedPdf {
    filename: String,
    file: NamedTempFile,
}

impl UploadedPdf {
    /// Write `bytes` to a new temp file in `dir`
    ///
    /// `raw_filename` is sanitised before use; the on-disk name is unique
    /// regardless of the client's filename.
    pub fn write(dir: &Path, raw_filename: &str, bytes: &[u8]) -> Result<Self, UploadError> {
        let filename = sanitize_filename(raw_filename);

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(
            filename = %filename,
            path = %file.path().display(),
            bytes = bytes.len(),
            "Upload staged"
        );

        Ok(Self { filename, file })
    }

    /// Location of the staged file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Sanitised client filename
    pub fn filename(&self) -> &str {
        &self.filename
    }
}
