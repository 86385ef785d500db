//! Application state.
//!
//! Everything a handler needs hangs off one `Arc<AppState>`: configuration,
//! the download store, the injected extraction provider, and the download
//! orchestrator built from both. There is no per-request mutable state.

use std::sync::Arc;
use std::time::Instant;

use vidrelay_core::Config;
use vidrelay_extractor::ExtractionProvider;
use vidrelay_storage::DownloadStore;

use crate::services::downloader::Downloader;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<DownloadStore>,
    pub provider: Arc<dyn ExtractionProvider>,
    pub downloader: Downloader,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<DownloadStore>,
        provider: Arc<dyn ExtractionProvider>,
    ) -> Self {
        let downloader = Downloader::new(provider.clone(), store.clone());
        AppState {
            config,
            store,
            provider,
            downloader,
            started_at: Instant::now(),
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
