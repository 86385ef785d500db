//! Test helpers: build the router with a fake extraction provider and an
//! isolated temporary storage root.
//!
//! Run from workspace root: `cargo test -p vidrelay-api --test api_test`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use tempfile::TempDir;

use vidrelay_api::setup;
use vidrelay_api::state::AppState;
use vidrelay_core::models::{FormatDescriptor, VideoMetadata};
use vidrelay_core::Config;
use vidrelay_extractor::{ExtractionProvider, ExtractorError, Fetched};

pub const FAKE_MEDIA: &[u8] = b"fake video bytes";

/// In-process extraction provider double. Probe returns a fixed number of
/// formats; fetch writes a small file unless told the format id is bad.
pub struct FakeProvider {
    pub probe_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    format_count: usize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Self::with_formats(3)
    }

    pub fn with_formats(format_count: usize) -> Arc<Self> {
        Arc::new(Self {
            probe_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            format_count,
        })
    }

    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, _url: &str) -> Result<VideoMetadata, ExtractorError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(VideoMetadata {
            title: "Test Video".to_string(),
            thumbnail: "https://example.com/thumb.jpg".to_string(),
            duration: Some(213),
            platform: "youtube".to_string(),
            formats: (0..self.format_count)
                .map(|i| FormatDescriptor {
                    format_id: i.to_string(),
                    resolution: format!("{}p", 144 + i * 100),
                    filesize: Some(1000 * (i as u64 + 1)),
                    note: None,
                })
                .collect(),
        })
    }

    async fn fetch(
        &self,
        _url: &str,
        format_id: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<Fetched, ExtractorError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if format_id == "bad" {
            return Err(ExtractorError::InvalidFormat(
                "Requested format is not available".to_string(),
            ));
        }

        let filename = format!("{}_Test_Video.mp4", stem);
        tokio::fs::write(dest_dir.join(&filename), FAKE_MEDIA)
            .await
            .expect("write fake media");
        Ok(Fetched::LocalFile { filename })
    }
}

/// Test application: server plus owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub provider: Arc<FakeProvider>,
    pub state: Arc<AppState>,
    pub temp_dir: TempDir,
}

impl TestApp {
    /// Names of files currently in the storage root.
    pub async fn stored_files(&self) -> Vec<String> {
        self.state
            .store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(Config::default(), FakeProvider::new()).await
}

pub async fn setup_test_app_with(mut config: Config, provider: Arc<FakeProvider>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("create temp storage root");
    config.download_dir = temp_dir.path().to_path_buf();

    let (state, router) = setup::initialize_app(config, provider.clone())
        .await
        .expect("initialize app");
    let server = TestServer::new(router).expect("start test server");

    TestApp {
        server,
        provider,
        state,
        temp_dir,
    }
}
