// Client configuration
//
// ClientConfig locates the run API and the local data directory:
// - Created directly for tests and embedding
// - Loaded from environment variables via `from_env`

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:9000";
const DEFAULT_DATA_DIR: &str = ".parley";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid API URL '{0}': must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("Invalid timeout '{0}': must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Configuration for the HTTP transport and local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the run API, without a trailing slash
    pub api_url: String,

    /// Bearer token sent with every request
    pub api_key: Option<String>,

    /// Directory holding `run-pointers.json`
    pub data_dir: PathBuf,

    /// Timeout for request/response calls; the live stream is exempt
    pub request_timeout: Duration,

    /// Timeout for establishing a TCP/TLS connection
    pub connect_timeout: Duration,

    /// Longest silence tolerated on the live stream, response headers included
    pub stream_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            stream_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::default().with_api_url(api_url)
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `PARLEY_API_URL`: run API base URL (default: http://localhost:9000)
    /// - `PARLEY_API_KEY`: bearer token (optional)
    /// - `PARLEY_DATA_DIR`: local data directory (default: .parley)
    /// - `PARLEY_STREAM_IDLE_TIMEOUT_SECS`: live stream silence limit (default: 60)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PARLEY_API_URL") {
            config = config.with_api_url(url);
        }
        config.api_key = std::env::var("PARLEY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = std::env::var("PARLEY_STREAM_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            config.stream_idle_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("request_timeout"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("connect_timeout"));
        }
        if self.stream_idle_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("stream_idle_timeout"));
        }
        Ok(())
    }
}
