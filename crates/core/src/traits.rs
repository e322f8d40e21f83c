// Core traits for pluggable backends
//
// These traits keep the controller transport-agnostic:
// - HTTP/SSE implementations for production (parley-client)
// - In-memory implementations for tests and embedding (memory.rs)

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use parley_schemas::{Run, RunEvent, RunEventsPage, RunStatus};

use crate::error::{ApiError, Result};

/// Live events of one run; ends on server close, network loss, or drop.
pub type RunEventStream = Pin<Box<dyn Stream<Item = std::result::Result<RunEvent, ApiError>> + Send>>;

// ============================================================================
// RunApi - Remote run operations
// ============================================================================

/// Remote operations the controller consumes
///
/// Implementations can:
/// - Talk to the run API over HTTP with SSE for the live stream
/// - Serve scripted runs from memory for tests
#[async_trait]
pub trait RunApi: Send + Sync {
    /// Create a run for a conversation, starting it with `message`
    async fn create_run(
        &self,
        project_id: &str,
        conversation_id: &str,
        message: &str,
    ) -> std::result::Result<Run, ApiError>;

    /// Append a user message to a finished run, restarting it
    async fn append_message(
        &self,
        run_id: &str,
        message: &str,
    ) -> std::result::Result<RunStatus, ApiError>;

    /// Current run status
    async fn get_run(&self, run_id: &str) -> std::result::Result<Run, ApiError>;

    /// Catch-up: events strictly after `after_seq` (all events when `None`)
    async fn get_run_events(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> std::result::Result<RunEventsPage, ApiError>;

    /// Open the live stream, delivering events after `after_seq`.
    ///
    /// Dropping the returned stream closes the connection.
    async fn stream_run(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> std::result::Result<RunEventStream, ApiError>;

    /// Ask the backend to stop the run
    async fn stop_run(&self, run_id: &str) -> std::result::Result<(), ApiError>;
}

// ============================================================================
// KeyValueStore - Durable string storage
// ============================================================================

/// Durable string key-value store
///
/// Implementations can:
/// - Persist entries in a JSON file
/// - Keep entries in memory for testing
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
