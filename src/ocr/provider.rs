//! OCR Engines
//!
//! Defines the engine trait and the Tesseract implementation.

use std::io::ErrorKind;

use async_trait::async_trait;
use tokio::process::Command;

use super::types::OcrError;

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Check if the engine can run
    async fn is_available(&self) -> bool;

    /// Recognize text in a PNG image
    ///
    /// `languages` uses Tesseract's `+`-joined model syntax.
    async fn recognize(&self, png: &[u8], languages: &str) -> Result<String, OcrError>;
}

/// Tesseract CLI engine
pub struct TesseractEngine {
    /// Executable name or path
    command: String,
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, png: &[u8], languages: &str) -> Result<String, OcrError> {
        // Removed when dropped, on every return path
        let input = tempfile::Builder::new()
            .prefix("ocr-input-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Processing(format!("Failed to create temp file: {}", e)))?;

        tokio::fs::write(input.path(), png)
            .await
            .map_err(|e| OcrError::Processing(format!("Failed to write temp file: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::EngineUnavailable(
                    format!("Failed to run {}: {}", self.command, e),
                ),
                _ => OcrError::Processing(format!("Failed to run tesseract: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Processing(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Mock engine for testing
#[cfg(test)]
pub(crate) struct MockEngine {
    pub response: Result<String, String>,
    pub available: bool,
    pub calls: std::sync::atomic::AtomicUsize,
    /// Time each recognition takes
    pub delay: std::time::Duration,
    in_flight: std::sync::atomic::AtomicUsize,
    peak: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockEngine {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            available: true,
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: std::time::Duration::ZERO,
            in_flight: std::sync::atomic::AtomicUsize::new(0),
            peak: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Returns `text` after holding each call open for `delay`
    pub fn slow(text: &str, delay: std::time::Duration) -> Self {
        Self {
            delay,
            ..Self::returning(text)
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            ..Self::returning("")
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::returning("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Most recognitions ever running at the same time
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, _png: &[u8], _languages: &str) -> Result<String, OcrError> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.response.clone().map_err(OcrError::Processing)
    }
}
