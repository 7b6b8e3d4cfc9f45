//! Gemini API client
//!
//! Calls `POST {base_url}/v1beta/models/{model}:generateContent` and joins
//! the text parts of the first candidate. Transport errors, 429 and 5xx
//! responses are retried with exponential backoff; other client errors are
//! returned immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Text-in, text-out model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Remote model errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Model API key is not configured")]
    MissingApiKey,

    #[error("Request to model service failed: {0}")]
    Transport(String),

    #[error("Model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each subsequent one
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemma-3-27b-it".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send(&self, body: &serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no candidates".to_string()))?;

        Ok(content.parts.into_iter().filter_map(|part| part.text).collect())
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let mut attempt = 0;
        loop {
            match self.send(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_backoff * 2u32.saturating_pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Model request failed: {}, retrying",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Mock model for testing
#[cfg(test)]
pub(crate) struct MockModel {
    pub prompts: std::sync::Mutex<Vec<String>>,
    pub fail: bool,
}

#[cfg(test)]
impl MockModel {
    pub fn new() -> Self {
        Self {
            prompts: std::sync::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        if self.fail {
            return Err(LlmError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(format!("response {}", prompts.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

    #[derive(Clone)]
    struct Upstream {
        calls: Arc<AtomicUsize>,
        failures: usize,
        failure_status: StatusCode,
    }

    async fn generate_content(
        State(upstream): State<Upstream>,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let call = upstream.calls.fetch_add(1, Ordering::SeqCst);
        if call < upstream.failures {
            return Err(upstream.failure_status);
        }

        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
        Ok(Json(serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "echo: " }, { "text": prompt }]
                }
            }]
        })))
    }

    async fn spawn_upstream(failures: usize, failure_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v1beta/models/:model_action", post(generate_content))
            .with_state(Upstream {
                calls: calls.clone(),
                failures,
                failure_status,
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), calls)
    }

    fn client(base_url: String) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            base_url,
            retry_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_joins_candidate_parts() {
        let (base_url, calls) = spawn_upstream(0, StatusCode::OK).await;

        let text = client(base_url).generate("hello").await.unwrap();

        assert_eq!(text, "echo: hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let (base_url, calls) = spawn_upstream(2, StatusCode::SERVICE_UNAVAILABLE).await;

        let text = client(base_url).generate("again").await.unwrap();

        assert_eq!(text, "echo: again");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (base_url, calls) = spawn_upstream(10, StatusCode::TOO_MANY_REQUESTS).await;

        let result = client(base_url).generate("busy").await;

        assert!(matches!(result, Err(LlmError::Status { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (base_url, calls) = spawn_upstream(1, StatusCode::BAD_REQUEST).await;

        let result = client(base_url).generate("bad").await;

        assert!(matches!(result, Err(LlmError::Status { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(matches!(
            client.generate("hi").await,
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_format() {
        let client = client("http://localhost:8080/".to_string());
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemma-3-27b-it:generateContent"
        );
    }
}
