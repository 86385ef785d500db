use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vidrelay_core::AppError;
use vidrelay_extractor::Platform;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    /// Relative URL the client fetches to receive the file.
    pub download_url: String,
    pub filename: String,
    pub size: u64,
}

#[utoipa::path(
    post,
    path = "/api/download",
    tag = "videos",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "File materialized and ready for delivery", body = DownloadResponse),
        (status = 400, description = "Missing fields or unrecognized format", body = ErrorResponse),
        (status = 502, description = "Download or extraction failed", body = ErrorResponse)
    )
)]
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let url = body.url.trim();
    let format_id = body.format_id.trim();
    if url.is_empty() || format_id.is_empty() {
        return Err(AppError::InvalidInput("URL and format id are required".to_string()).into());
    }

    if Platform::match_url(url).is_none() {
        return Err(AppError::UnsupportedUrl(
            "Unsupported platform or invalid URL".to_string(),
        )
        .into());
    }

    let result = state.downloader.download(url, format_id).await?;

    Ok(Json(DownloadResponse {
        success: true,
        download_url: format!("/api/download/file/{}", result.filename),
        filename: result.filename,
        size: result.size,
    }))
}
