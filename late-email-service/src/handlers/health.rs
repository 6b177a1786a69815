use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Has no dependencies, so it never fails.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}
