//! HTTP routes for pdfsum-server

pub mod docs;
pub mod index;
pub mod summarize;

use axum::{extract::DefaultBodyLimit, extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Request body ceiling for an upload limit of `max_upload_bytes`
///
/// Leaves room for base64 expansion and multipart framing; the decoded
/// document itself is checked against `max_upload_bytes`.
pub fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.saturating_mul(4) / 3 + 64 * 1024
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limit = body_limit(state.config().limits.max_upload_bytes);

    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health_check))
        .route("/api", get(docs::api_docs))
        .merge(summarize::router())
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
