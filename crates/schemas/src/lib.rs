// Parley Schemas
//
// Decision: This crate is the source of truth for the agentic run wire types
// Decision: Minimal dependencies - only serde and serde_json
// Decision: No runtime logic - only type definitions and event classification

pub mod events;
pub mod run;

// Event types
pub use events::{
    EventKind, RunEvent, ASSISTANT_MESSAGE, MESSAGES_SNAPSHOT, MESSAGE_AGENT, MESSAGE_ASSISTANT,
    MESSAGE_USER, RUN_FAILED, RUN_TIMEOUT, STATE_SYNC, TOOL_CALL_COMPLETED, TOOL_CALL_FAILED,
    TOOL_CALL_STARTED, TOOL_END, TOOL_ERROR, TOOL_START, USER_MESSAGE,
};

// Run types
pub use run::{
    AppendMessageRequest, AppendMessageResponse, CreateRunRequest, Run, RunEventsPage, RunStatus,
};
