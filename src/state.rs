//! Application state management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::config::Config;
use crate::extraction::Extractor;
use crate::llm::{GeminiClient, LanguageModel, LlmError, Summarizer};
use crate::ocr::{OcrEngine, TesseractEngine};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize model client: {0}")]
    ModelClient(#[from] LlmError),

    #[error("Failed to prepare upload directory: {0}")]
    UploadDir(#[from] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extractor: Extractor,
    summarizer: Summarizer,
    upload_dir: UploadDir,
}

/// Where uploads are staged
enum UploadDir {
    /// Removed with the state
    Owned(TempDir),
    Configured(PathBuf),
}

impl UploadDir {
    fn prepare(configured: Option<&Path>) -> std::io::Result<Self> {
        match configured {
            Some(path) => {
                std::fs::create_dir_all(path)?;
                Ok(Self::Configured(path.to_path_buf()))
            }
            None => Ok(Self::Owned(
                tempfile::Builder::new().prefix("pdfsum-uploads-").tempdir()?,
            )),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Owned(dir) => dir.path(),
            Self::Configured(path) => path,
        }
    }
}

impl AppState {
    /// Build the state with the Tesseract CLI and the Gemini client
    pub fn new(config: Config) -> Result<Self, StateError> {
        let engine = Arc::new(TesseractEngine::new(config.ocr.command.clone()));
        let model = Arc::new(GeminiClient::new(config.gemini())?);
        Self::from_parts(config, engine, model)
    }

    /// Build the state around explicit OCR and model implementations
    pub fn from_parts(
        config: Config,
        engine: Arc<dyn OcrEngine>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self, StateError> {
        let upload_dir = UploadDir::prepare(config.upload_dir.as_deref())?;
        let extractor = Extractor::new(engine, config.extractor());
        let summarizer = Summarizer::new(model);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor,
                summarizer,
                upload_dir,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document extractor
    pub fn extractor(&self) -> &Extractor {
        &self.inner.extractor
    }

    /// Get the summarizer
    pub fn summarizer(&self) -> &Summarizer {
        &self.inner.summarizer
    }

    /// Directory uploads are staged in
    pub fn upload_dir(&self) -> &Path {
        self.inner.upload_dir.path()
    }
}
