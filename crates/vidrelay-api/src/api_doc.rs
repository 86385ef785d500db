//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::detect::{DetectRequest, DetectResponse};
use crate::handlers::download::{DownloadRequest, DownloadResponse};
use crate::handlers::health::HealthResponse;
use vidrelay_core::models::{FormatDescriptor, VideoMetadata};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidrelay API",
        description = "Detect video formats from a URL, download the selected format, and retrieve the file."
    ),
    paths(
        crate::handlers::detect::detect,
        crate::handlers::download::start_download,
        crate::handlers::deliver::deliver_file,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        DetectRequest,
        DetectResponse,
        DownloadRequest,
        DownloadResponse,
        HealthResponse,
        ErrorResponse,
        VideoMetadata,
        FormatDescriptor,
    )),
    tags(
        (name = "videos", description = "Detect, download, and deliver videos"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
