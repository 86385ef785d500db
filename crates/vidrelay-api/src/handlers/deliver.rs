use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::Stream;

use vidrelay_core::AppError;
use vidrelay_storage::{DownloadStore, StorageError};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Byte stream that deletes the underlying file when it is dropped.
///
/// Drop runs on both completion and client disconnect, which is exactly the
/// delivery contract: once a transfer has started, the file must not
/// linger. A file already removed (e.g. by the sweeper) is not an error.
struct DeliverStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>,
    filepath: PathBuf,
    filename: String,
}

impl Stream for DeliverStream {
    type Item = Result<Bytes, StorageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl Drop for DeliverStream {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.filepath) {
            Ok(()) => {
                tracing::info!(filename = %self.filename, "Removed file after delivery");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, filename = %self.filename, "Failed to remove delivered file");
            }
        }
    }
}

/// Best-effort content type from the filename extension.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "opus" | "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/api/download/file/{filename}",
    tag = "videos",
    params(
        ("filename" = String, Path, description = "Filename returned by the download endpoint")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", content_type = "application/octet-stream"),
        (status = 403, description = "Filename rejected", body = ErrorResponse),
        (status = 404, description = "File missing or already delivered", body = ErrorResponse)
    )
)]
pub async fn deliver_file(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, HttpAppError> {
    // Strip directory components before the name touches the filesystem.
    let safe_name = DownloadStore::sanitize(&filename).map_err(HttpAppError::from)?;
    let filepath = state.store.resolve(&safe_name).map_err(HttpAppError::from)?;

    let stream = state
        .store
        .read_stream(&safe_name)
        .await
        .map_err(HttpAppError::from)?;

    tracing::info!(filename = %safe_name, "Delivering file");

    let guarded = DeliverStream {
        inner: stream,
        filepath,
        filename: safe_name.clone(),
    };
    let body_stream = futures::StreamExt::map(guarded, |result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&safe_name))
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", safe_name),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build delivery response");
            HttpAppError(AppError::Internal(e.to_string()))
        })
}
