//! Extraction providers.
//!
//! The rest of the system treats video extraction as an opaque capability:
//! given a URL, report metadata and formats; given a URL and a format id,
//! produce something downloadable. Two interchangeable backends implement
//! that capability — the local `yt-dlp` binary and a remote Cobalt API —
//! selected by configuration at startup.

mod cobalt;
mod platform;
mod provider;
mod ytdlp;

use std::sync::Arc;

use vidrelay_core::{Config, ExtractionBackend};

pub use cobalt::CobaltProvider;
pub use platform::Platform;
pub use provider::{ExtractionProvider, ExtractorError, Fetched};
pub use ytdlp::YtDlpProvider;

/// Build the extraction provider selected by configuration.
pub fn create_provider(config: &Config) -> Arc<dyn ExtractionProvider> {
    match config.extraction_backend {
        ExtractionBackend::YtDlp => Arc::new(YtDlpProvider::new(
            config.ytdlp_path.clone(),
            config.ytdlp_timeout,
        )),
        ExtractionBackend::Cobalt => Arc::new(CobaltProvider::new(config.cobalt_api_url.clone())),
    }
}
