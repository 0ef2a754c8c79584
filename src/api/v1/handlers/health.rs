/*
 * Responsibility
 * - GET /health (疎通用、認証・/api/v1 の外)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "service": env!("CARGO_PKG_NAME")})),
    )
}
