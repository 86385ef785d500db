use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vidrelay_core::models::VideoMetadata;
use vidrelay_core::AppError;
use vidrelay_extractor::Platform;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DetectRequest {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DetectResponse {
    pub success: bool,
    pub data: VideoMetadata,
}

#[utoipa::path(
    post,
    path = "/api/detect",
    tag = "videos",
    request_body = DetectRequest,
    responses(
        (status = 200, description = "Video metadata and selectable formats", body = DetectResponse),
        (status = 400, description = "Missing or unsupported URL", body = ErrorResponse),
        (status = 502, description = "Extraction backend failed", body = ErrorResponse)
    )
)]
pub async fn detect(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DetectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidInput("URL is required".to_string()).into());
    }

    // Unsupported URLs are rejected here; the extraction backend is never
    // invoked for them.
    let platform = Platform::match_url(url).ok_or_else(|| {
        AppError::UnsupportedUrl(
            "Unsupported platform or invalid URL. Supported: YouTube, TikTok, Instagram, \
             Facebook, Twitter/X, Vimeo."
                .to_string(),
        )
    })?;

    tracing::info!(platform = %platform, backend = state.provider.name(), "Probing video URL");

    let metadata = state
        .provider
        .probe(url)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, backend = state.provider.name(), "Probe failed");
            AppError::ExtractionFailed(e.to_string())
        })?
        .truncate_formats(state.config.max_formats);

    Ok(Json(DetectResponse {
        success: true,
        data: metadata,
    }))
}
