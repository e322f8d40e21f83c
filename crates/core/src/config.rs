// Synchronization configuration
//
// SyncConfig tunes the failover policy of the controller:
// - Created directly with defaults for tests and embedding
// - Loaded from environment variables via `from_env`

use std::time::Duration;

use crate::error::{Result, SyncError};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_STREAM_FAILURE_THRESHOLD: u32 = 2;
const DEFAULT_STREAM_RETRY_DELAY_MS: u64 = 1000;

/// Configuration for the synchronization controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Period of the catch-up poller once the stream is considered unreliable
    pub poll_interval: Duration,

    /// Consecutive stream failures before falling back to polling
    pub stream_failure_threshold: u32,

    /// Delay before a new stream attempt while under the failure threshold
    pub stream_retry_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stream_failure_threshold: DEFAULT_STREAM_FAILURE_THRESHOLD,
            stream_retry_delay: Duration::from_millis(DEFAULT_STREAM_RETRY_DELAY_MS),
        }
    }
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `PARLEY_POLL_INTERVAL_MS`: polling period in milliseconds (default: 1500)
    /// - `PARLEY_STREAM_FAILURE_THRESHOLD`: failures before polling (default: 2)
    /// - `PARLEY_STREAM_RETRY_DELAY_MS`: delay before a stream retry (default: 1000)
    pub fn from_env() -> Self {
        let poll_interval_ms = env_parse("PARLEY_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        let stream_failure_threshold = env_parse(
            "PARLEY_STREAM_FAILURE_THRESHOLD",
            DEFAULT_STREAM_FAILURE_THRESHOLD,
        );
        let retry_delay_ms = env_parse(
            "PARLEY_STREAM_RETRY_DELAY_MS",
            DEFAULT_STREAM_RETRY_DELAY_MS,
        );

        Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            stream_failure_threshold,
            stream_retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }

    /// Set the polling period
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the failure threshold that enables polling
    pub fn with_stream_failure_threshold(mut self, threshold: u32) -> Self {
        self.stream_failure_threshold = threshold;
        self
    }

    /// Set the delay before retrying a failed stream
    pub fn with_stream_retry_delay(mut self, delay: Duration) -> Self {
        self.stream_retry_delay = delay;
        self
    }

    /// Reject values that would make the failover policy spin or never engage
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(SyncError::config("poll interval must be greater than zero"));
        }
        if self.stream_failure_threshold == 0 {
            return Err(SyncError::config(
                "stream failure threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.stream_failure_threshold, 2);
        assert_eq!(config.stream_retry_delay, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SyncConfig::new()
            .with_poll_interval(Duration::from_millis(250))
            .with_stream_failure_threshold(3)
            .with_stream_retry_delay(Duration::from_millis(10));

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.stream_failure_threshold, 3);
        assert_eq!(config.stream_retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = SyncConfig::new().with_poll_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(SyncError::Configuration(_))
        ));

        let config = SyncConfig::new().with_stream_failure_threshold(0);
        assert!(config.validate().is_err());
    }
}
