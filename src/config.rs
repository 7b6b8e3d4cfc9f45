//! Configuration management for pdfsum-server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::extraction::ExtractorConfig;
use crate::llm::GeminiConfig;
use crate::ocr::DEFAULT_OCR_LANGUAGES;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub ocr: OcrConfig,
    pub limits: LimitsConfig,
    /// Staging directory for uploads; a fresh temp dir when unset
    pub upload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub command: String,
    pub languages: String,
    pub workers: usize,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_concurrent_extractions: usize,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

/// Invalid environment value
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            model: ModelConfig {
                api_key: String::new(),
                model: "gemma-3-27b-it".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                max_retries: 2,
                retry_backoff_ms: 500,
                timeout_secs: 120,
            },
            ocr: OcrConfig {
                command: "tesseract".to_string(),
                languages: DEFAULT_OCR_LANGUAGES.to_string(),
                workers: default_workers(),
            },
            limits: LimitsConfig {
                max_concurrent_extractions: 4,
                request_timeout_secs: 300,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            upload_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: text("SERVER_HOST", defaults.server.host),
                port: parsed("SERVER_PORT", defaults.server.port)?,
            },
            model: ModelConfig {
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: text("GEMINI_MODEL", defaults.model.model),
                base_url: text("GEMINI_BASE_URL", defaults.model.base_url),
                max_retries: parsed("LLM_MAX_RETRIES", defaults.model.max_retries)?,
                retry_backoff_ms: parsed("LLM_RETRY_BACKOFF_MS", defaults.model.retry_backoff_ms)?,
                timeout_secs: parsed("LLM_TIMEOUT_SECS", defaults.model.timeout_secs)?,
            },
            ocr: OcrConfig {
                command: text("TESSERACT_CMD", defaults.ocr.command),
                languages: text("OCR_LANGUAGES", defaults.ocr.languages),
                workers: parsed("OCR_WORKERS", defaults.ocr.workers)?,
            },
            limits: LimitsConfig {
                max_concurrent_extractions: parsed(
                    "MAX_CONCURRENT_EXTRACTIONS",
                    defaults.limits.max_concurrent_extractions,
                )?,
                request_timeout_secs: parsed(
                    "REQUEST_TIMEOUT_SECS",
                    defaults.limits.request_timeout_secs,
                )?,
                max_upload_bytes: parsed("MAX_UPLOAD_BYTES", defaults.limits.max_upload_bytes)?,
            },
            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.model.api_key.clone(),
            model: self.model.model.clone(),
            base_url: self.model.base_url.clone(),
            max_retries: self.model.max_retries,
            retry_backoff: Duration::from_millis(self.model.retry_backoff_ms),
            timeout: Duration::from_secs(self.model.timeout_secs),
        }
    }

    pub fn extractor(&self) -> ExtractorConfig {
        ExtractorConfig {
            ocr_languages: self.ocr.languages.clone(),
            ocr_workers: self.ocr.workers,
            max_concurrent_extractions: self.limits.max_concurrent_extractions,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.request_timeout_secs)
    }
}

/// Read `var`, falling back to `default` when unset or blank
fn text(var: &str, default: String) -> String {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

/// Read `var`, falling back to `default` when unset or blank
fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
        _ => Ok(default),
    }
}
