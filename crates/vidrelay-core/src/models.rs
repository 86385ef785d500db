//! Domain models
//!
//! These are the shapes exchanged between the extraction providers, the
//! download orchestrator, and the HTTP surface. Nothing here is persisted:
//! a `VideoMetadata` lives for one detect request, a `DownloadResult` for
//! one download/deliver cycle.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One selectable quality/codec option for a source video.
///
/// `format_id` is opaque: it is only meaningful to the extraction backend
/// that produced it and must be passed back verbatim on download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormatDescriptor {
    pub format_id: String,
    pub resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Normalized metadata for a probed video URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub platform: String,
    pub formats: Vec<FormatDescriptor>,
}

impl VideoMetadata {
    /// Cap the format list at `max`, preserving insertion order.
    pub fn truncate_formats(mut self, max: usize) -> Self {
        self.formats.truncate(max);
        self
    }
}

/// A fully materialized download, ready for one delivery.
///
/// The underlying file is deleted after the first successful (or aborted)
/// delivery, at which point this record is invalid.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub filename: String,
    pub filepath: PathBuf,
    pub size: u64,
}
