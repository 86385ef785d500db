//! Download orchestration.
//!
//! One call, one file: the orchestrator picks a unique filename stem, hands
//! it to the extraction provider, and blocks until the media is fully on
//! disk. Backends that resolve a remote URL instead of writing the file
//! themselves get their second hop streamed here, chunk by chunk. A failed
//! download leaves no partial files behind.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use vidrelay_core::models::DownloadResult;
use vidrelay_core::AppError;
use vidrelay_extractor::{ExtractionProvider, ExtractorError, Fetched};
use vidrelay_storage::DownloadStore;

#[derive(Clone)]
pub struct Downloader {
    provider: Arc<dyn ExtractionProvider>,
    store: Arc<DownloadStore>,
    http: reqwest::Client,
}

impl Downloader {
    pub fn new(provider: Arc<dyn ExtractionProvider>, store: Arc<DownloadStore>) -> Self {
        Self {
            provider,
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Unique filename stem: unix-millis plus a short random suffix, so
    /// collisions are practically impossible within the process lifetime.
    fn unique_stem() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            &suffix[..6]
        )
    }

    /// Materialize the media selected by `format_id` on disk and return its
    /// name, absolute path, and size. Blocks until the file is complete.
    pub async fn download(&self, url: &str, format_id: &str) -> Result<DownloadResult, AppError> {
        let stem = Self::unique_stem();
        tracing::info!(
            backend = self.provider.name(),
            format_id,
            stem = %stem,
            "Starting download"
        );

        let result = self.download_with_stem(url, format_id, &stem).await;

        if result.is_err() {
            // A failed download must leave nothing in storage.
            match self.store.remove_by_prefix(&stem).await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(stem = %stem, removed, "Removed partial download files")
                }
                Err(e) => tracing::warn!(error = %e, stem = %stem, "Partial cleanup failed"),
            }
        }

        result
    }

    async fn download_with_stem(
        &self,
        url: &str,
        format_id: &str,
        stem: &str,
    ) -> Result<DownloadResult, AppError> {
        let fetched = self
            .provider
            .fetch(url, format_id, self.store.root(), stem)
            .await
            .map_err(map_fetch_error)?;

        let filename = match fetched {
            Fetched::LocalFile { filename } => filename,
            Fetched::RemoteUrl { url, ext } => self.stream_remote(&url, stem, &ext).await?,
        };

        // The provider reported success; the file must actually be there.
        let size = self
            .store
            .size(&filename)
            .await
            .map_err(|_| AppError::FileMissing(filename.clone()))?;

        tracing::info!(filename = %filename, size, "Download complete");

        Ok(DownloadResult {
            filepath: self.store.root().join(&filename),
            filename,
            size,
        })
    }

    /// Second hop: stream a resolved remote URL into storage without
    /// buffering the whole body.
    async fn stream_remote(
        &self,
        remote_url: &str,
        stem: &str,
        ext: &str,
    ) -> Result<String, AppError> {
        let filename = format!("{}.{}", stem, ext);

        let response = self.http.get(remote_url).send().await.map_err(|e| {
            AppError::DownloadFailed(format!("Failed to reach resolved media link: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::DownloadFailed(format!(
                "Resolved media link returned HTTP {}",
                response.status()
            )));
        }

        let mut file = self.store.create(&filename).await.map_err(|e| {
            AppError::DownloadFailed(format!("Failed to create media file: {}", e))
        })?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::DownloadFailed(format!("Media stream interrupted: {}", e))
            })?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::DownloadFailed(format!("Failed to write media chunk: {}", e))
            })?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::DownloadFailed(format!("Failed to flush media file: {}", e)))?;

        tracing::debug!(filename = %filename, bytes = written, "Streamed remote media to storage");
        Ok(filename)
    }
}

fn map_fetch_error(err: ExtractorError) -> AppError {
    match err {
        ExtractorError::InvalidFormat(msg) => {
            AppError::InvalidFormat(format!("Format not recognized: {}", msg))
        }
        ExtractorError::FileMissing(msg) => AppError::FileMissing(msg),
        ExtractorError::ToolNotFound(tool) => {
            AppError::Internal(format!("Extraction tool not found: {}", tool))
        }
        other => AppError::DownloadFailed(other.to_string()),
    }
}
