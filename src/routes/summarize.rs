//! Summarize Routes
//!
//! Endpoints:
//! - POST /api/summarize - Summarize an uploaded or base64-encoded PDF
//! - POST /summarize - Same, for the web form
//!
//! Both accept `multipart/form-data` with a `file` field, or a JSON body
//! `{ "content": <base64>, "filename"?, "classification"?, "language"? }`.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    routing::post,
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::llm::Language;
use crate::state::AppState;
use crate::upload::{has_pdf_extension, UploadError, UploadedPdf, DEFAULT_FILENAME};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/summarize", post(summarize))
        .route("/summarize", post(summarize))
}

/// Validated summarize request
#[derive(Debug)]
pub struct SummarizeUpload {
    /// Client filename, before sanitisation
    pub filename: String,
    pub bytes: Bytes,
    pub classify: bool,
    pub language: Language,
}

#[derive(Deserialize)]
struct JsonUpload {
    content: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    classification: Flag,
    language: Option<String>,
}

/// `true`, `false`, `"true"` or `"false"`
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Bool(false)
    }
}

impl Flag {
    fn enabled(&self) -> bool {
        match self {
            Flag::Bool(value) => *value,
            Flag::Text(value) => value.trim().eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
    classification: String,
    filename: String,
    status: &'static str,
}

#[async_trait]
impl FromRequest<AppState> for SummarizeUpload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let max = state.config().limits.max_upload_bytes;

        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        let upload = if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            from_multipart(multipart).await?
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            from_json(&body)?
        };

        if upload.filename.is_empty() {
            return Err(UploadError::EmptyFilename.into());
        }
        if !has_pdf_extension(&upload.filename) {
            return Err(UploadError::InvalidFileType.into());
        }
        if upload.bytes.len() > max {
            return Err(UploadError::TooLarge {
                size: upload.bytes.len(),
                max,
            }
            .into());
        }

        Ok(upload)
    }
}

async fn from_multipart(mut multipart: Multipart) -> std::result::Result<SummarizeUpload, UploadError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut classify = false;
    let mut language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Malformed(e.to_string()))?;
                tracing::debug!(filename = %filename, bytes = data.len(), "Received file field");
                file = Some((filename, data));
            }
            "classification" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.to_string()))?;
                classify = value.trim() == "true";
            }
            "language" => {
                language = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| UploadError::Malformed(e.to_string()))?,
                );
            }
            _ => tracing::debug!(field = %name, "Ignoring multipart field"),
        }
    }

    let (filename, bytes) = file.ok_or(UploadError::Missing)?;
    Ok(SummarizeUpload {
        filename,
        bytes,
        classify,
        language: parse_language(language),
    })
}

fn from_json(body: &[u8]) -> std::result::Result<SummarizeUpload, UploadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(UploadError::Missing);
    }

    let upload: JsonUpload =
        serde_json::from_slice(body).map_err(|e| UploadError::Malformed(e.to_string()))?;
    let content = upload.content.ok_or(UploadError::Missing)?;
    let bytes = decode_base64(&content)?;

    Ok(SummarizeUpload {
        filename: upload
            .filename
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        bytes: Bytes::from(bytes),
        classify: upload.classification.enabled(),
        language: parse_language(upload.language),
    })
}

fn decode_base64(content: &str) -> std::result::Result<Vec<u8>, UploadError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| UploadError::InvalidBase64(e.to_string()))
}

fn parse_language(code: Option<String>) -> Language {
    code.map(|code| Language::from_code(&code)).unwrap_or_default()
}

/// Summarize a PDF document
async fn summarize(
    State(state): State<AppState>,
    upload: SummarizeUpload,
) -> Result<Json<SummarizeResponse>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "summarize",
        %request_id,
        filename = %upload.filename,
        classify = upload.classify,
    );

    process(state, upload).instrument(span).await.map(Json)
}

async fn process(state: AppState, upload: SummarizeUpload) -> Result<SummarizeResponse> {
    let SummarizeUpload {
        filename,
        bytes,
        classify,
        language,
    } = upload;

    let dir = state.upload_dir().to_path_buf();
    let staged = tokio::task::spawn_blocking(move || UploadedPdf::write(&dir, &filename, &bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Staging task failed: {}", e)))??;

    let timeout = state.config().request_timeout();
    let work = async {
        let text = state.extractor().extract(staged.path()).await?;
        tracing::info!(chars = text.chars().count(), "Document extracted");

        let outcome = state
            .summarizer()
            .run(&text, classify.then_some(language))
            .await?;
        Ok::<_, AppError>(outcome)
    };

    let outcome = tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| AppError::Timeout(timeout.as_secs()))??;

    tracing::info!("Summary complete");

    Ok(SummarizeResponse {
        summary: outcome.summary,
        classification: outcome.classification,
        filename: staged.filename().to_string(),
        status: "success",
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::Engine as _;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::llm::{LanguageModel, LlmError, MockModel};
    use crate::ocr::MockEngine;
    use crate::routes::{app, testing};
    use crate::test_support::{build_pdf, PageSpec};

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn encoded_pdf(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(build_pdf(&[PageSpec::text(text)]))
    }

    fn upload_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    const BOUNDARY: &str = "pdfsum-test-boundary";

    fn multipart_request(uri: &str, filename: &str, pdf: &[u8], fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(pdf);
        body.extend_from_slice(b"\r\n");
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_base64_upload_is_summarized() {
        let (state, uploads, model) = testing::mock_state();

        let response = app(state)
            .oneshot(json_request(
                "/api/summarize",
                json!({ "content": encoded_pdf("Hello world"), "filename": "../My Doc.pdf" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = testing::json_body(response).await;
        assert_eq!(body["summary"], "response 1");
        assert_eq!(body["classification"], "");
        assert_eq!(body["filename"], "My_Doc.pdf");
        assert_eq!(body["status"], "success");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Hello world"));
        assert_eq!(upload_count(uploads.path()), 0);
    }

    #[tokio::test]
    async fn test_json_classification_flag_as_string() {
        let (state, _uploads, model) = testing::mock_state();

        let response = app(state)
            .oneshot(json_request(
                "/api/summarize",
                json!({ "content": encoded_pdf("Hello"), "classification": "true", "language": "ru" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = testing::json_body(response).await;
        assert_eq!(body["classification"], "response 2");
        assert_eq!(body["filename"], "document.pdf");
        assert!(model.prompts()[1].contains("'Финансовый'"));
    }

    #[tokio::test]
    async fn test_multipart_upload_with_classification() {
        let (state, uploads, model) = testing::mock_state();
        let pdf = build_pdf(&[PageSpec::text("Scanned contract")]);

        let response = app(state)
            .oneshot(multipart_request(
                "/summarize",
                "contract.PDF",
                &pdf,
                &[("classification", "true"), ("language", "en")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = testing::json_body(response).await;
        assert_eq!(body["filename"], "contract.PDF");
        assert_eq!(body["classification"], "response 2");
        assert!(model.prompts()[1].contains("'Legal'"));
        assert_eq!(upload_count(uploads.path()), 0);
    }

    #[tokio::test]
    async fn test_multipart_without_language_uses_armenian() {
        let (state, _uploads, model) = testing::mock_state();
        let pdf = build_pdf(&[PageSpec::text("text")]);

        let response = app(state)
            .oneshot(multipart_request("/api/summarize", "a.pdf", &pdf, &[("classification", "true")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(model.prompts()[1].contains("'ֆինանսական'"));
    }

    #[tokio::test]
    async fn test_multipart_empty_filename() {
        let (state, _uploads, _) = testing::mock_state();

        let response = app(state)
            .oneshot(multipart_request("/summarize", "", b"%PDF", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = testing::json_body(response).await;
        assert_eq!(body["error"], "No selected file");
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_filename() {
        let (state, _uploads, model) = testing::mock_state();

        let response = app(state)
            .oneshot(json_request(
                "/api/summarize",
                json!({ "content": encoded_pdf("x"), "filename": "notes.txt" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = testing::json_body(response).await;
        assert_eq!(body["error"], "Invalid file type. Only PDFs are allowed.");
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_base64() {
        let (state, _uploads, _) = testing::mock_state();

        let response = app(state)
            .oneshot(json_request("/api/summarize", json!({ "content": "not base64!!" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = testing::json_body(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid base64 content: "));
    }

    #[tokio::test]
    async fn test_rejects_missing_content() {
        let (state, _uploads, _) = testing::mock_state();
        let router = app(state);

        let response = router
            .clone()
            .oneshot(json_request("/api/summarize", json!({ "filename": "a.pdf" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            testing::json_body(response).await["error"],
            "No file uploaded or content provided"
        );

        let response = router
            .oneshot(Request::post("/api/summarize").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_oversized_document() {
        let (state, uploads) = testing::state_with(
            Arc::new(MockEngine::returning("")),
            Arc::new(MockModel::new()),
            |config| config.limits.max_upload_bytes = 64,
        );
        let content = base64::engine::general_purpose::STANDARD.encode([0u8; 100]);

        let response = app(state)
            .oneshot(json_request("/api/summarize", json!({ "content": content })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(upload_count(uploads.path()), 0);
    }

    #[tokio::test]
    async fn test_unparseable_pdf_is_server_error_and_cleaned_up() {
        let (state, uploads, model) = testing::mock_state();
        let content = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 garbage");

        let response = app(state)
            .oneshot(json_request("/api/summarize", json!({ "content": content })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(testing::json_body(response).await["status"], "error");
        assert!(model.prompts().is_empty());
        assert_eq!(upload_count(uploads.path()), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error_and_cleaned_up() {
        let (state, uploads) = testing::state_with(
            Arc::new(MockEngine::returning("")),
            Arc::new(MockModel::failing()),
            |_| {},
        );

        let response = app(state)
            .oneshot(json_request("/api/summarize", json!({ "content": encoded_pdf("Hello") })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upload_count(uploads.path()), 0);
    }

    struct StalledModel;

    #[async_trait]
    impl LanguageModel for StalledModel {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (state, uploads) = testing::state_with(
            Arc::new(MockEngine::returning("")),
            Arc::new(StalledModel),
            |config| config.limits.request_timeout_secs = 1,
        );

        let response = app(state)
            .oneshot(json_request("/api/summarize", json!({ "content": encoded_pdf("Hello") })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            testing::json_body(response).await["error"],
            "Request timed out after 1 seconds"
        );
        assert_eq!(upload_count(uploads.path()), 0);
    }

    #[test]
    fn test_base64_ignores_line_breaks() {
        assert_eq!(decode_base64("SGVs\nbG8=\r\n").unwrap(), b"Hello");
    }
}
