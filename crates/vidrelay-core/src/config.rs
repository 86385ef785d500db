//! Configuration module
//!
//! All settings come from the environment (optionally via a `.env` file
//! loaded by the binary). Every value has a default so the service starts
//! with no configuration at all.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
const DEFAULT_MAX_FILE_AGE_MS: u64 = 24 * 60 * 60 * 1000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 900;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_MAX_FORMATS: usize = 10;
const DEFAULT_YTDLP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_COBALT_API_URL: &str = "https://api.cobalt.tools/api/json";

/// Which extraction backend serves probe/fetch requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionBackend {
    /// Shell out to the local `yt-dlp` binary.
    YtDlp,
    /// Call a remote Cobalt API instance.
    Cobalt,
}

impl FromStr for ExtractionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ytdlp" | "yt-dlp" => Ok(ExtractionBackend::YtDlp),
            "cobalt" => Ok(ExtractionBackend::Cobalt),
            other => Err(anyhow::anyhow!(
                "Unknown extraction backend '{}' (expected 'ytdlp' or 'cobalt')",
                other
            )),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    /// Storage root: scratch directory for files awaiting delivery.
    pub download_dir: PathBuf,
    /// Age after which a stored file becomes eligible for sweeping.
    pub max_file_age: Duration,
    pub sweep_interval: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    /// Upper bound on the format list returned by detect.
    pub max_formats: usize,
    pub extraction_backend: ExtractionBackend,
    pub ytdlp_path: String,
    pub ytdlp_timeout: Duration,
    pub cobalt_api_url: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        // CORS_ORIGIN preferred; CLIENT_URL kept as the legacy alias.
        let cors_origins_str = env::var("CORS_ORIGIN")
            .or_else(|_| env::var("CLIENT_URL"))
            .unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let extraction_backend = env::var("EXTRACTION_BACKEND")
            .unwrap_or_else(|_| "ytdlp".to_string())
            .parse::<ExtractionBackend>()?;

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            download_dir: PathBuf::from(
                env::var("DOWNLOAD_DIR").unwrap_or_else(|_| DEFAULT_DOWNLOAD_DIR.to_string()),
            ),
            max_file_age: Duration::from_millis(
                env::var("MAX_FILE_AGE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_FILE_AGE_MS),
            ),
            sweep_interval: Duration::from_secs(
                env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
            rate_limit_window: Duration::from_secs(
                env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            ),
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
            max_formats: env::var("MAX_FORMATS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FORMATS),
            extraction_backend,
            ytdlp_path: env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            ytdlp_timeout: Duration::from_secs(
                env::var("YTDLP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_YTDLP_TIMEOUT_SECS),
            ),
            cobalt_api_url: env::var("COBALT_API_URL")
                .unwrap_or_else(|_| DEFAULT_COBALT_API_URL.to_string()),
            environment,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_formats == 0 {
            return Err(anyhow::anyhow!("MAX_FORMATS must be at least 1"));
        }
        if self.rate_limit_max_requests == 0 {
            return Err(anyhow::anyhow!("RATE_LIMIT_MAX_REQUESTS must be at least 1"));
        }
        if self.sweep_interval.is_zero() {
            return Err(anyhow::anyhow!("SWEEP_INTERVAL_SECS must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    /// Defaults used by tests; `from_env` applies the same values when the
    /// environment is empty.
    fn default() -> Self {
        Config {
            server_port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            max_file_age: Duration::from_millis(DEFAULT_MAX_FILE_AGE_MS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            max_formats: DEFAULT_MAX_FORMATS,
            extraction_backend: ExtractionBackend::YtDlp,
            ytdlp_path: "yt-dlp".to_string(),
            ytdlp_timeout: Duration::from_secs(DEFAULT_YTDLP_TIMEOUT_SECS),
            cobalt_api_url: DEFAULT_COBALT_API_URL.to_string(),
            environment: "development".to_string(),
        }
    }
}
