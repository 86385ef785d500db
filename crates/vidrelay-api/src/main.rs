use std::sync::Arc;

use vidrelay_api::services::sweeper::RetentionSweeper;
use vidrelay_core::Config;

// Use mimalloc as the global allocator for better performance and lower
// fragmentation, especially when running on musl-based systems inside
// containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    vidrelay_api::telemetry::init_telemetry()?;

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    let provider = vidrelay_extractor::create_provider(&config);
    tracing::info!(backend = provider.name(), "Extraction provider selected");

    // Initialize the application (storage, services, routes)
    let (state, router) = vidrelay_api::setup::initialize_app(config.clone(), provider).await?;

    // The sweeper owns the recurring cleanup of the storage root; its first
    // pass runs immediately to reclaim space left by a prior crash.
    let sweeper = Arc::new(RetentionSweeper::new(
        state.store.clone(),
        config.max_file_age,
        config.sweep_interval,
    ));
    let sweeper_handle = sweeper.start();

    // Start the server
    vidrelay_api::setup::server::start_server(&config, router, sweeper_handle).await?;

    Ok(())
}
