//! yt-dlp backend.
//!
//! Probe runs `yt-dlp --dump-json` and normalizes the JSON document; fetch
//! runs a real download with an output template carrying the caller's
//! unique stem, then recovers whichever filename the tool chose by scanning
//! for that stem. Both run under a timeout and with the child killed if the
//! future is dropped.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use vidrelay_core::models::{FormatDescriptor, VideoMetadata};

use crate::provider::{ExtractionProvider, ExtractorError, Fetched};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub struct YtDlpProvider {
    path: String,
    timeout: Duration,
}

impl YtDlpProvider {
    pub fn new(path: String, timeout: Duration) -> Self {
        Self { path, timeout }
    }

    fn probe_args(url: &str) -> Vec<String> {
        vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificates".to_string(),
            "--geo-bypass".to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
            url.to_string(),
        ]
    }

    fn fetch_args(url: &str, format_id: &str, dest_dir: &Path, stem: &str) -> Vec<String> {
        let template = format!("{}/{}_%(title)s.%(ext)s", dest_dir.display(), stem);
        vec![
            "-f".to_string(),
            format_id.to_string(),
            "-o".to_string(),
            template,
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificates".to_string(),
            "--restrict-filenames".to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
            url.to_string(),
        ]
    }

    async fn run(&self, args: Vec<String>) -> Result<Output, ExtractorError> {
        let child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::ToolNotFound(self.path.clone())
                } else {
                    ExtractorError::ExtractionFailed(format!("Failed to spawn yt-dlp: {}", e))
                }
            })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExtractorError::ExtractionFailed(format!(
                "yt-dlp did not finish: {}",
                e
            ))),
            // kill_on_drop reaps the child when the timeout fires
            Err(_) => Err(ExtractorError::Timeout(self.timeout.as_secs())),
        }
    }

    fn failure_from_stderr(stderr: &str) -> ExtractorError {
        if stderr.contains("Requested format is not available")
            || stderr.contains("requested format not available")
        {
            ExtractorError::InvalidFormat(stderr.trim().to_string())
        } else {
            ExtractorError::FetchFailed(stderr.trim().to_string())
        }
    }
}

#[async_trait]
impl ExtractionProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<VideoMetadata, ExtractorError> {
        let output = self.run(Self::probe_args(url)).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::ExtractionFailed(stderr.trim().to_string()));
        }

        parse_probe_json(&output.stdout)
    }

    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<Fetched, ExtractorError> {
        let output = self
            .run(Self::fetch_args(url, format_id, dest_dir, stem))
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failure_from_stderr(&stderr));
        }

        // yt-dlp expands the title into the final name; the stem prefix is
        // the only part we control, so recover the file through it.
        match find_by_stem(dest_dir, stem).await? {
            Some(filename) => Ok(Fetched::LocalFile { filename }),
            None => Err(ExtractorError::FileMissing(format!(
                "yt-dlp reported success but no file with stem '{}' exists",
                stem
            ))),
        }
    }
}

/// Normalize a `--dump-json` document into `VideoMetadata`.
fn parse_probe_json(stdout: &[u8]) -> Result<VideoMetadata, ExtractorError> {
    let json: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| ExtractorError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))?;

    let formats = json["formats"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter(|f| {
                    // Storyboards and other codec-less entries are useless to select.
                    let vcodec = f["vcodec"].as_str().unwrap_or("none");
                    let acodec = f["acodec"].as_str().unwrap_or("none");
                    vcodec != "none" || acodec != "none"
                })
                .map(format_from_json)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(VideoMetadata {
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
        duration: json["duration"].as_f64().map(|d| d.max(0.0) as u64),
        platform: json["extractor"].as_str().unwrap_or("video").to_lowercase(),
        formats,
    })
}

fn format_from_json(f: &serde_json::Value) -> FormatDescriptor {
    let resolution = f["resolution"]
        .as_str()
        .map(str::to_string)
        .or_else(|| {
            match (f["width"].as_u64(), f["height"].as_u64()) {
                (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
                _ => None,
            }
        })
        .unwrap_or_else(|| "audio only".to_string());

    FormatDescriptor {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        resolution,
        filesize: f["filesize"].as_u64().or_else(|| f["filesize_approx"].as_u64()),
        note: f["format_note"].as_str().map(str::to_string),
    }
}

/// First regular file in `dir` whose name starts with `{stem}_`.
async fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<String>, ExtractorError> {
    let prefix = format!("{}_", stem);
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ExtractorError::FetchFailed(format!("Cannot scan {}: {}", dir.display(), e)))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExtractorError::FetchFailed(format!("Cannot scan {}: {}", dir.display(), e)))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && entry.file_type().await.map(|t| t.is_file()).unwrap_or(false)
        {
            return Ok(Some(name));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_JSON: &str = r#"{
        "title": "Never Gonna Give You Up",
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
        "duration": 213.0,
        "extractor": "Youtube",
        "formats": [
            {"format_id": "sb0", "vcodec": "none", "acodec": "none", "format_note": "storyboard"},
            {"format_id": "140", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3433514, "format_note": "medium"},
            {"format_id": "22", "vcodec": "avc1", "acodec": "mp4a.40.2", "width": 1280, "height": 720, "format_note": "720p"},
            {"format_id": "137", "vcodec": "avc1", "acodec": "none", "resolution": "1920x1080", "filesize_approx": 50000000}
        ]
    }"#;

    #[test]
    fn test_parse_probe_json_normalizes_metadata() {
        let metadata = parse_probe_json(PROBE_JSON.as_bytes()).unwrap();

        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert!(metadata.thumbnail.contains("ytimg.com"));
        assert_eq!(metadata.duration, Some(213));
        assert_eq!(metadata.platform, "youtube");
    }

    #[test]
    fn test_parse_probe_json_filters_codec_less_formats() {
        let metadata = parse_probe_json(PROBE_JSON.as_bytes()).unwrap();

        let ids: Vec<_> = metadata
            .formats
            .iter()
            .map(|f| f.format_id.as_str())
            .collect();
        assert_eq!(ids, ["140", "22", "137"]);

        assert_eq!(metadata.formats[0].resolution, "audio only");
        assert_eq!(metadata.formats[0].filesize, Some(3433514));
        assert_eq!(metadata.formats[1].resolution, "1280x720");
        assert_eq!(metadata.formats[2].resolution, "1920x1080");
        assert_eq!(metadata.formats[2].filesize, Some(50000000));
    }

    #[test]
    fn test_parse_probe_json_rejects_invalid_json() {
        assert!(matches!(
            parse_probe_json(b"ERROR: not json"),
            Err(ExtractorError::ParseError(_))
        ));
    }

    #[test]
    fn test_failure_from_stderr_detects_bad_format() {
        let err = YtDlpProvider::failure_from_stderr(
            "ERROR: [youtube] dQw4w9WgXcQ: Requested format is not available",
        );
        assert!(matches!(err, ExtractorError::InvalidFormat(_)));

        let err = YtDlpProvider::failure_from_stderr("ERROR: unable to download video data");
        assert!(matches!(err, ExtractorError::FetchFailed(_)));
    }

    #[test]
    fn test_fetch_args_carry_stem_template() {
        let args =
            YtDlpProvider::fetch_args("https://youtu.be/x", "22", Path::new("/tmp/dl"), "123_ab");
        let template_pos = args.iter().position(|a| a == "-o").unwrap() + 1;
        assert_eq!(args[template_pos], "/tmp/dl/123_ab_%(title)s.%(ext)s");
        assert!(args.contains(&"--restrict-filenames".to_string()));
    }

    #[tokio::test]
    async fn test_find_by_stem_picks_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("123_ab_Some_Title.mp4"), b"x")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("unrelated.mp4"), b"y")
            .await
            .unwrap();

        let found = find_by_stem(dir.path(), "123_ab").await.unwrap();
        assert_eq!(found.as_deref(), Some("123_ab_Some_Title.mp4"));

        let missing = find_by_stem(dir.path(), "999_zz").await.unwrap();
        assert!(missing.is_none());
    }
}
