// Error types for the run synchronization engine

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors reported by a run transport (catch-up, stream, submission calls)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Run or conversation does not exist
    #[error("Not found")]
    NotFound,

    /// Caller may not access the run
    #[error("Forbidden")]
    Forbidden,

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Live stream could not be opened or broke mid-way
    #[error("Stream error: {0}")]
    Stream(String),
}

impl ApiError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        ApiError::Transport(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        ApiError::Decode(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        ApiError::Stream(msg.into())
    }

    /// A stored run pointer that fails this way is stale and gets dropped
    pub fn is_resumption_failure(&self) -> bool {
        matches!(self, ApiError::NotFound | ApiError::Forbidden)
    }
}

/// Errors surfaced to the caller of the synchronization controller
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message was empty or whitespace
    #[error("Message is empty")]
    EmptyMessage,

    /// No conversation is open
    #[error("No conversation is open")]
    NoConversation,

    /// A run is already queued or running
    #[error("A run is already in progress")]
    RunInProgress,

    /// A stop was requested and the run has not finished yet
    #[error("Stop requested; waiting for the run to finish")]
    StopPending,

    /// Stop is only valid while a run is queued or running
    #[error("No active run to stop")]
    NotStoppable,

    /// Remote call rejected
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Run pointer store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SyncError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        SyncError::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        SyncError::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumption_failures() {
        assert!(ApiError::NotFound.is_resumption_failure());
        assert!(ApiError::Forbidden.is_resumption_failure());
        assert!(!ApiError::transport("connection reset").is_resumption_failure());
        assert!(!ApiError::Api {
            status: 500,
            message: "boom".to_string()
        }
        .is_resumption_failure());
    }

    #[test]
    fn test_api_error_passes_through_sync_error() {
        let err: SyncError = ApiError::Forbidden.into();
        assert_eq!(err.to_string(), "Forbidden");
        assert!(matches!(err, SyncError::Api(ApiError::Forbidden)));
    }
}
