// Agentic Run Synchronization
//
// This crate drives a long-running, server-executed agent run to completion
// while observing it through two unreliable transports (live stream and
// catch-up), and turns the raw event sequence into a consistent timeline.
//
// Key design decisions:
// - Uses traits (RunApi, KeyValueStore) for pluggable backends
// - Events are merged by `seq` only, so duplicates and reordering are harmless
// - Projections are pure functions of the event log, recomputed on every merge
// - Stream failures escalate to interval polling after a configurable threshold
// - Every background task is cancellable; none outlives its run or conversation

pub mod config;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod event_log;
pub mod persistence;
pub mod projection;
pub mod traits;

// In-memory implementations for embedding and testing
pub mod memory;

// Re-exports for convenience
pub use config::SyncConfig;
pub use controller::{ConversationScope, SyncController, SyncView};
pub use cursor::SyncCursor;
pub use error::{ApiError, Result, SyncError};
pub use event_log::{merge_events, EventLog, MergeOutcome};
pub use memory::{ApiCall, InMemoryKeyValueStore, InMemoryRunApi};
pub use persistence::{pointer_key, RunPointers};
pub use projection::{
    project, project_messages, project_tool_activity, MessageRole, SummaryLine, Timeline,
    TimelineMessage, ToolActivity, ToolStatus,
};
pub use traits::{KeyValueStore, RunApi, RunEventStream};

pub use parley_schemas::{RunEvent, RunStatus};
