//! Cobalt API backend.
//!
//! Cobalt exposes no separate info endpoint, so probe is synthetic: a
//! platform tag from the URL, a placeholder thumbnail, and a fixed pair of
//! selectable formats. Fetch is the first hop of a two-hop download — it
//! resolves a direct media URL which the orchestrator then streams to disk.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vidrelay_core::models::{FormatDescriptor, VideoMetadata};

use crate::platform::Platform;
use crate::provider::{ExtractionProvider, ExtractorError, Fetched};

const PLACEHOLDER_THUMBNAIL: &str = "https://placehold.co/600x400/1e293b/FFF?text=Video+Found";

pub const FORMAT_BEST: &str = "auto";
pub const FORMAT_AUDIO: &str = "audio";

pub struct CobaltProvider {
    api_url: String,
    client: reqwest::Client,
}

impl CobaltProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CobaltRequest<'a> {
    url: &'a str,
    v_codec: &'a str,
    v_quality: &'a str,
    a_format: &'a str,
    is_audio_only: bool,
}

#[derive(Debug, Deserialize)]
struct CobaltResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    picker: Vec<CobaltPickerItem>,
}

#[derive(Debug, Deserialize)]
struct CobaltPickerItem {
    url: String,
}

/// Pull the direct media link out of a Cobalt response.
///
/// `stream`/`redirect` carry it in `url`; `picker` responses list several
/// items of which the first is the video; `error` carries a message in
/// `text`.
fn resolve_download_url(response: CobaltResponse) -> Result<String, ExtractorError> {
    if response.status.as_deref() == Some("error") {
        return Err(ExtractorError::FetchFailed(
            response
                .text
                .unwrap_or_else(|| "Cobalt API reported an error".to_string()),
        ));
    }

    if response.status.as_deref() == Some("picker") {
        if let Some(item) = response.picker.into_iter().next() {
            return Ok(item.url);
        }
    }

    response.url.ok_or_else(|| {
        ExtractorError::FetchFailed("No download link returned by provider".to_string())
    })
}

#[async_trait]
impl ExtractionProvider for CobaltProvider {
    fn name(&self) -> &'static str {
        "cobalt"
    }

    async fn probe(&self, url: &str) -> Result<VideoMetadata, ExtractorError> {
        let platform = Platform::match_url(url)
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "video".to_string());

        let mut title_tag = platform.clone();
        if let Some(first) = title_tag.get_mut(0..1) {
            first.make_ascii_uppercase();
        }

        Ok(VideoMetadata {
            title: format!("Download {}", title_tag),
            thumbnail: PLACEHOLDER_THUMBNAIL.to_string(),
            duration: None,
            platform,
            formats: vec![
                FormatDescriptor {
                    format_id: FORMAT_BEST.to_string(),
                    resolution: "Best quality".to_string(),
                    filesize: None,
                    note: Some("MP4 via Cobalt".to_string()),
                },
                FormatDescriptor {
                    format_id: FORMAT_AUDIO.to_string(),
                    resolution: "Audio (MP3)".to_string(),
                    filesize: None,
                    note: Some("Audio only".to_string()),
                },
            ],
        })
    }

    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        _dest_dir: &Path,
        _stem: &str,
    ) -> Result<Fetched, ExtractorError> {
        let is_audio = match format_id {
            FORMAT_AUDIO => true,
            FORMAT_BEST => false,
            other => {
                return Err(ExtractorError::InvalidFormat(format!(
                    "Cobalt backend only offers '{}' and '{}', got '{}'",
                    FORMAT_BEST, FORMAT_AUDIO, other
                )));
            }
        };

        let request = CobaltRequest {
            url,
            v_codec: "h264",
            v_quality: "1080",
            a_format: "mp3",
            is_audio_only: is_audio,
        };

        tracing::debug!(api_url = %self.api_url, is_audio, "Requesting download link from Cobalt");

        // First hop: resolve the provider link.
        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body: CobaltResponse = response.json().await.map_err(|e| {
            ExtractorError::ParseError(format!("Invalid JSON from Cobalt API: {}", e))
        })?;

        if !status.is_success() && body.status.as_deref() != Some("error") {
            return Err(ExtractorError::FetchFailed(format!(
                "Cobalt API returned HTTP {}",
                status
            )));
        }

        let download_url = resolve_download_url(body)?;
        tracing::debug!(download_url = %download_url, "Cobalt resolved a media link");

        Ok(Fetched::RemoteUrl {
            url: download_url,
            ext: if is_audio { "mp3" } else { "mp4" }.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> CobaltResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolve_download_url_stream_status() {
        let url =
            resolve_download_url(response(r#"{"status":"stream","url":"https://cdn/x.mp4"}"#))
                .unwrap();
        assert_eq!(url, "https://cdn/x.mp4");
    }

    #[test]
    fn test_resolve_download_url_picker_takes_first() {
        let url = resolve_download_url(response(
            r#"{"status":"picker","picker":[{"url":"https://cdn/a.mp4"},{"url":"https://cdn/b.mp4"}]}"#,
        ))
        .unwrap();
        assert_eq!(url, "https://cdn/a.mp4");
    }

    #[test]
    fn test_resolve_download_url_error_status() {
        let err = resolve_download_url(response(
            r#"{"status":"error","text":"link is unsupported"}"#,
        ))
        .unwrap_err();
        match err {
            ExtractorError::FetchFailed(msg) => assert_eq!(msg, "link is unsupported"),
            other => panic!("Expected FetchFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_download_url_missing_link() {
        let err = resolve_download_url(response(r#"{"status":"stream"}"#)).unwrap_err();
        assert!(matches!(err, ExtractorError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn test_probe_is_synthetic_and_bounded() {
        let provider = CobaltProvider::new("https://api.example/json".to_string());
        let metadata = provider
            .probe("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap();

        assert_eq!(metadata.title, "Download Youtube");
        assert_eq!(metadata.platform, "youtube");
        assert!(!metadata.thumbnail.is_empty());
        assert_eq!(metadata.formats.len(), 2);
        assert_eq!(metadata.formats[0].format_id, FORMAT_BEST);
        assert_eq!(metadata.formats[1].format_id, FORMAT_AUDIO);
    }

    #[tokio::test]
    async fn test_fetch_rejects_unknown_format_before_any_request() {
        let provider = CobaltProvider::new("https://api.example/json".to_string());
        let err = provider
            .fetch(
                "https://www.youtube.com/watch?v=x",
                "1080p-premium",
                Path::new("/tmp"),
                "stem",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidFormat(_)));
    }
}
