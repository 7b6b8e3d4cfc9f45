//! API documentation endpoint

use axum::Json;
use serde_json::{json, Map, Value};

use crate::llm::Language;

/// Describe the summarize endpoint and the classification labels
pub async fn api_docs() -> Json<Value> {
    let categories: Map<String, Value> = Language::ALL
        .iter()
        .map(|language| (language.code().to_string(), json!(language.categories())))
        .collect();
    let languages: Vec<&str> = Language::ALL.iter().map(|language| language.code()).collect();

    Json(json!({
        "endpoints": {
            "/api/summarize": {
                "method": "POST",
                "description": "Summarize a PDF document",
                "parameters": {
                    "file": "PDF file to process (multipart, or base64 in a JSON \"content\" field)",
                    "filename": "file name for JSON uploads (optional, default: document.pdf)",
                    "classification": "boolean (true/false) to enable classification (optional, default: false)",
                    "language": "language code (hy/en/ru) for classification categories (optional, default: hy)"
                },
                "response": {
                    "summary": "text summary of the document",
                    "classification": "document classification if enabled",
                    "filename": "sanitized filename",
                    "status": "success or error"
                }
            },
            "/health": {
                "method": "GET",
                "description": "Liveness check"
            }
        },
        "languages_supported": languages,
        "classification_categories": categories
    }))
}
