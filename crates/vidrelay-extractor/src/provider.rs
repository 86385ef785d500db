use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use vidrelay_core::models::VideoMetadata;

/// Extraction backend errors.
///
/// Backends fold whatever their tool or API reports into these variants;
/// callers must not assume any structure beyond them.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Extraction tool not found: {0}")]
    ToolNotFound(String),

    #[error("Format not recognized: {0}")]
    InvalidFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("No file materialized: {0}")]
    FileMissing(String),

    #[error("Failed to parse extractor output: {0}")]
    ParseError(String),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What a fetch produced.
#[derive(Debug)]
pub enum Fetched {
    /// The backend wrote the file into the destination directory itself;
    /// `filename` is the name it ended up with.
    LocalFile { filename: String },
    /// The backend resolved a direct media URL; the caller is responsible
    /// for streaming it to disk (the second hop).
    RemoteUrl { url: String, ext: String },
}

/// Opaque external extraction capability.
///
/// Format ids are only meaningful to the backend that issued them via
/// `probe`; passing a format id across backends is undefined and will
/// surface as `InvalidFormat` or `FetchFailed`.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Report metadata and selectable formats for a video URL.
    async fn probe(&self, url: &str) -> Result<VideoMetadata, ExtractorError>;

    /// Produce the media selected by `format_id`, either directly into
    /// `dest_dir` using `stem` as the unique filename stem, or as a remote
    /// URL for the caller to stream.
    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<Fetched, ExtractorError>;
}
