// Run Event Protocol
//
// This module defines the event shape emitted by the agent run backend.
// Every event carries a per-run sequence number (`seq`), a type discriminator,
// and a loosely structured payload whose shape depends on the type.
// `seq` is the sole ordering and deduplication key on the client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::run::RunStatus;

// ============================================================================
// Event Type Constants
// ============================================================================

pub const USER_MESSAGE: &str = "user.message";
pub const ASSISTANT_MESSAGE: &str = "assistant.message";
pub const TOOL_START: &str = "on_tool_start";
pub const TOOL_END: &str = "on_tool_end";
pub const TOOL_ERROR: &str = "on_tool_error";
pub const RUN_FAILED: &str = "run.failed";
pub const RUN_TIMEOUT: &str = "run.timeout";
pub const STATE_SYNC: &str = "state.sync";

// Aliases emitted by other agent runtimes
pub const MESSAGE_USER: &str = "message.user";
pub const MESSAGE_AGENT: &str = "message.agent";
pub const MESSAGE_ASSISTANT: &str = "message.assistant";
pub const TOOL_CALL_STARTED: &str = "tool.call_started";
pub const TOOL_CALL_COMPLETED: &str = "tool.call_completed";
pub const TOOL_CALL_FAILED: &str = "tool.call_failed";
pub const MESSAGES_SNAPSHOT: &str = "messages.snapshot";

// ============================================================================
// Event Kind
// ============================================================================

/// Classification of a raw event type string.
///
/// Projections match on this instead of comparing strings, so every source
/// of messages and tool activity has exactly one extraction branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserMessage,
    AssistantMessage,
    ToolStart,
    ToolEnd,
    ToolError,
    RunFailed,
    RunTimeout,
    /// Full snapshot of conversation state re-broadcast by some runtimes
    StateSync,
    /// Vendor-specific passthrough; ignored by projections
    Other,
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            USER_MESSAGE | MESSAGE_USER => EventKind::UserMessage,
            ASSISTANT_MESSAGE | MESSAGE_AGENT | MESSAGE_ASSISTANT => EventKind::AssistantMessage,
            TOOL_START | TOOL_CALL_STARTED => EventKind::ToolStart,
            TOOL_END | TOOL_CALL_COMPLETED => EventKind::ToolEnd,
            TOOL_ERROR | TOOL_CALL_FAILED => EventKind::ToolError,
            RUN_FAILED => EventKind::RunFailed,
            RUN_TIMEOUT => EventKind::RunTimeout,
            STATE_SYNC | MESSAGES_SNAPSHOT => EventKind::StateSync,
            _ => EventKind::Other,
        }
    }

    /// Status forced by events that end the run as observed by the client
    pub fn terminal_status(&self) -> Option<RunStatus> {
        match self {
            EventKind::RunFailed => Some(RunStatus::Failed),
            EventKind::RunTimeout => Some(RunStatus::Timeout),
            _ => None,
        }
    }
}

// ============================================================================
// Run Event
// ============================================================================

/// An immutable fact in a run's history.
///
/// Two events of the same run with the same `seq` are the same event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl RunEvent {
    pub fn new(seq: u64, event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            seq,
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_primary_types() {
        assert_eq!(EventKind::from_type("user.message"), EventKind::UserMessage);
        assert_eq!(
            EventKind::from_type("assistant.message"),
            EventKind::AssistantMessage
        );
        assert_eq!(EventKind::from_type("on_tool_start"), EventKind::ToolStart);
        assert_eq!(EventKind::from_type("on_tool_end"), EventKind::ToolEnd);
        assert_eq!(EventKind::from_type("on_tool_error"), EventKind::ToolError);
        assert_eq!(EventKind::from_type("run.failed"), EventKind::RunFailed);
        assert_eq!(EventKind::from_type("run.timeout"), EventKind::RunTimeout);
        assert_eq!(EventKind::from_type("state.sync"), EventKind::StateSync);
    }

    #[test]
    fn test_kind_from_aliases() {
        assert_eq!(EventKind::from_type("message.user"), EventKind::UserMessage);
        assert_eq!(
            EventKind::from_type("message.agent"),
            EventKind::AssistantMessage
        );
        assert_eq!(
            EventKind::from_type("tool.call_completed"),
            EventKind::ToolEnd
        );
        assert_eq!(
            EventKind::from_type("messages.snapshot"),
            EventKind::StateSync
        );
    }

    #[test]
    fn test_terminal_status() {
        assert_eq!(
            EventKind::from_type(RUN_FAILED).terminal_status(),
            Some(RunStatus::Failed)
        );
        assert_eq!(
            EventKind::from_type(RUN_TIMEOUT).terminal_status(),
            Some(RunStatus::Timeout)
        );
        assert_eq!(EventKind::ToolError.terminal_status(), None);
    }

    #[test]
    fn test_unknown_type_is_passthrough() {
        let kind = EventKind::from_type("vendor.heartbeat");
        assert_eq!(kind, EventKind::Other);
        assert_eq!(kind.terminal_status(), None);
    }

    #[test]
    fn test_event_serialization() {
        let event = RunEvent::new(5, TOOL_START, json!({"name": "search"}));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["seq"], 5);
        assert_eq!(json["type"], "on_tool_start");
        assert_eq!(json["payload"]["name"], "search");
    }

    #[test]
    fn test_event_without_payload_deserializes() {
        let event: RunEvent = serde_json::from_str(r#"{"seq": 10, "type": "run.timeout"}"#).unwrap();

        assert_eq!(event.seq, 10);
        assert_eq!(event.payload, Value::Null);
        assert_eq!(event.kind().terminal_status(), Some(RunStatus::Timeout));
    }
}
