//! Health check handler.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub storage: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Storage root unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    let storage = match state.store.list().await {
        Ok(_) => "healthy".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            format!("degraded: {}", e)
        }
    };

    let healthy = storage == "healthy";
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now(),
        storage,
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
