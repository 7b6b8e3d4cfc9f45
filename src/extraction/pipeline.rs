//! Extraction pipeline
//!
//! ```text
//!            ┌── spawn_blocking: text layer (MuPDF) ──┐
//! path ──────┤                                        ├── merge ── String
//!            └── spawn_blocking: images (lopdf) ──────┘
//!                        │
//!                        └── per image: decode + OCR (bounded by OCR slots)
//! ```
//!
//! Two semaphores bound resource use: one caps how many documents are
//! extracted at once, the other caps how many images are decoded and
//! recognized at once across all documents.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use super::merger::merge_reading_order;
use crate::document::{DocumentError, DocumentResult, ImageOcrResult, PageImage};
use crate::ocr::{OcrEngine, OcrError, DEFAULT_OCR_LANGUAGES};
use crate::pdf::{decode_to_png, extract_page_images, extract_text_layer};

/// Extraction pool configuration
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Tesseract language models
    pub ocr_languages: String,
    /// Images decoded and recognized at once
    pub ocr_workers: usize,
    /// Documents extracted at once
    pub max_concurrent_extractions: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            ocr_workers: 4,
            max_concurrent_extractions: 4,
        }
    }
}

/// PDF to reading-order text
#[derive(Clone)]
pub struct Extractor {
    inner: Arc<ExtractorInner>,
}

struct ExtractorInner {
    engine: Arc<dyn OcrEngine>,
    languages: String,
    ocr_slots: Semaphore,
    extraction_slots: Semaphore,
}

impl Extractor {
    pub fn new(engine: Arc<dyn OcrEngine>, config: ExtractorConfig) -> Self {
        Self {
            inner: Arc::new(ExtractorInner {
                engine,
                languages: config.ocr_languages,
                ocr_slots: Semaphore::new(config.ocr_workers.max(1)),
                extraction_slots: Semaphore::new(config.max_concurrent_extractions.max(1)),
            }),
        }
    }

    /// The OCR engine in use
    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.inner.engine
    }

    /// Extract the document at `path` as one reading-order string
    pub async fn extract(&self, path: &Path) -> DocumentResult<String> {
        let _slot = self
            .inner
            .extraction_slots
            .acquire()
            .await
            .map_err(|e| DocumentError::Worker(e.to_string()))?;

        let text_path = path.to_path_buf();
        let image_path = path.to_path_buf();

        let (spans, images) = tokio::try_join!(
            run_blocking(move || extract_text_layer(&text_path)),
            run_blocking(move || extract_page_images(&image_path)),
        )?;

        tracing::debug!(
            pages = spans.len(),
            images = images.len(),
            "Extraction passes complete"
        );

        let ocr_results = self.recognize_all(images).await?;
        Ok(merge_reading_order(&spans, ocr_results))
    }

    async fn recognize_all(&self, images: Vec<PageImage>) -> DocumentResult<Vec<ImageOcrResult>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let engine = &self.inner.engine;
        if !engine.is_available().await {
            return Err(OcrError::EngineUnavailable(format!(
                "{} is not installed or not runnable",
                engine.name()
            ))
            .into());
        }

        Ok(join_all(images.into_iter().map(|image| self.recognize_image(image))).await)
    }

    /// OCR one image; failures become empty text
    async fn recognize_image(&self, image: PageImage) -> ImageOcrResult {
        let page_index = image.page_index;
        let y_position = image.y_position;

        let ocr_text = match self.ocr_image(image).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    page = page_index,
                    y_position,
                    "Image OCR failed, using empty text: {}",
                    e
                );
                String::new()
            }
        };

        ImageOcrResult {
            page_index,
            y_position,
            ocr_text,
        }
    }

    async fn ocr_image(&self, image: PageImage) -> Result<String, OcrError> {
        let _slot = self
            .inner
            .ocr_slots
            .acquire()
            .await
            .map_err(|e| OcrError::Processing(e.to_string()))?;

        let png = tokio::task::spawn_blocking(move || decode_to_png(&image))
            .await
            .map_err(|e| OcrError::Processing(format!("Decode task failed: {}", e)))??;

        let text = self
            .inner
            .engine
            .recognize(&png, &self.inner.languages)
            .await?;

        Ok(text.trim().to_string())
    }
}

async fn run_blocking<T, F>(f: F) -> DocumentResult<T>
where
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
