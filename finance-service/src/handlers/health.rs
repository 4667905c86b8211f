//! Health, readiness and metrics endpoints.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::metrics::get_metrics;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "finance-service" }))
}

/// The store is in-process, so readiness and liveness coincide.
pub async fn readiness_check() -> impl IntoResponse {
    Json(json!({ "status": "ready" }))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
