//! Application assembly: storage, state, and routes.

pub mod routes;
pub mod server;

use std::sync::Arc;

use axum::Router;

use vidrelay_core::Config;
use vidrelay_extractor::ExtractionProvider;
use vidrelay_storage::DownloadStore;

use crate::state::AppState;

/// Build the application state and router.
///
/// The extraction provider is injected so tests can substitute a fake.
pub async fn initialize_app(
    config: Config,
    provider: Arc<dyn ExtractionProvider>,
) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let store = Arc::new(DownloadStore::new(&config.download_dir).await?);
    tracing::info!(download_dir = %store.root().display(), "Storage root ready");

    let state = Arc::new(AppState::new(config.clone(), store, provider));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
