//! Health Check API Handler

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
/// Liveness probe; does not touch the database or the build queue
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
