// Message projection
//
// Maps the ordered event log to render-ready timeline messages.
// Granular message events and periodic state snapshots may describe the same
// assistant output; both feed one ordered map keyed by derived id, so a later
// occurrence replaces an earlier one in place without reordering.

use std::collections::HashMap;

use parley_schemas::{EventKind, RunEvent};
use serde::Serialize;
use serde_json::Value;

use super::payload::{content_text, error_text, first_str, message_text};

const RUN_FAILED_FALLBACK: &str = "The run failed.";
const RUN_TIMEOUT_FALLBACK: &str = "The run timed out.";

/// Who a timeline message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    SystemNotice,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::SystemNotice => write!(f, "system_notice"),
        }
    }
}

/// Render-ready message derived from the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineMessage {
    /// Stable across re-derivation
    pub id: String,
    pub role: MessageRole,
    pub content: String,
}

impl TimelineMessage {
    fn from_event(event: &RunEvent, role: MessageRole, content: String) -> Self {
        let suffix = match role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::SystemNotice => "notice",
        };
        Self {
            id: format!("{}:{}", event.seq, suffix),
            role,
            content,
        }
    }
}

/// Project messages from events ascending by `seq`.
pub fn project_messages<'a>(events: impl IntoIterator<Item = &'a RunEvent>) -> Vec<TimelineMessage> {
    let mut timeline = OrderedMessages::default();

    for event in events {
        match event.kind() {
            EventKind::UserMessage => {
                if let Some(text) = message_text(&event.payload) {
                    timeline.upsert(TimelineMessage::from_event(event, MessageRole::User, text));
                }
            }
            EventKind::AssistantMessage => {
                if let Some(text) = message_text(&event.payload) {
                    timeline.upsert(TimelineMessage::from_event(
                        event,
                        MessageRole::Assistant,
                        text,
                    ));
                }
            }
            EventKind::RunFailed => {
                let text = notice_text(&event.payload).unwrap_or_else(|| RUN_FAILED_FALLBACK.into());
                timeline.upsert(TimelineMessage::from_event(
                    event,
                    MessageRole::SystemNotice,
                    text,
                ));
            }
            EventKind::RunTimeout => {
                let text =
                    notice_text(&event.payload).unwrap_or_else(|| RUN_TIMEOUT_FALLBACK.into());
                timeline.upsert(TimelineMessage::from_event(
                    event,
                    MessageRole::SystemNotice,
                    text,
                ));
            }
            EventKind::StateSync => {
                for message in snapshot_messages(event) {
                    timeline.upsert(message);
                }
            }
            EventKind::ToolStart | EventKind::ToolEnd | EventKind::ToolError | EventKind::Other => {}
        }
    }

    timeline.into_vec()
}

fn notice_text(payload: &Value) -> Option<String> {
    error_text(payload).or_else(|| message_text(payload))
}

/// Assistant messages embedded in a state snapshot
fn snapshot_messages(event: &RunEvent) -> Vec<TimelineMessage> {
    let entries = event
        .payload
        .get("messages")
        .or_else(|| event.payload.get("state").and_then(|s| s.get("messages")))
        .and_then(Value::as_array);

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| first_str(entry, &["role"]) == Some("assistant"))
        .filter_map(|(index, entry)| {
            let content = entry.get("content").and_then(content_text)?;
            let id = match entry.get("id") {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => format!("{}:snapshot:{}", event.seq, index),
            };
            Some(TimelineMessage {
                id,
                role: MessageRole::Assistant,
                content,
            })
        })
        .collect()
}

/// Insertion-ordered messages keyed by id; replacing keeps the first position
#[derive(Default)]
struct OrderedMessages {
    positions: HashMap<String, usize>,
    items: Vec<TimelineMessage>,
}

impl OrderedMessages {
    fn upsert(&mut self, message: TimelineMessage) {
        match self.positions.get(&message.id) {
            Some(&index) => self.items[index] = message,
            None => {
                self.positions.insert(message.id.clone(), self.items.len());
                self.items.push(message);
            }
        }
    }

    fn into_vec(self) -> Vec<TimelineMessage> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ev(seq: u64, event_type: &str, payload: Value) -> RunEvent {
        RunEvent::new(seq, event_type, payload)
    }

    #[test]
    fn test_user_message() {
        let events = vec![ev(0, "user.message", json!({"content": "Hello"}))];
        let messages = project_messages(&events);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[0].id, "0:user");
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        let events = vec![
            ev(0, "user.message", json!({"content": ""})),
            ev(1, "assistant.message", json!({})),
            ev(2, "assistant.message", json!(null)),
        ];
        assert!(project_messages(&events).is_empty());
    }

    #[test]
    fn test_run_failed_notice() {
        let events = vec![
            ev(3, "run.failed", json!({})),
            ev(4, "run.failed", json!({"error": "Model quota exceeded"})),
        ];
        let messages = project_messages(&events);

        assert_eq!(messages[0].role, MessageRole::SystemNotice);
        assert_eq!(messages[0].content, "The run failed.");
        assert_eq!(messages[1].content, "Model quota exceeded");
    }

    #[test]
    fn test_run_timeout_notice() {
        let messages = project_messages(&[ev(10, "run.timeout", json!(null))]);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "10:notice");
        assert_eq!(messages[0].content, "The run timed out.");
    }

    #[test]
    fn test_tool_and_unknown_events_ignored() {
        let events = vec![
            ev(0, "on_tool_start", json!({"name": "search"})),
            ev(1, "vendor.custom", json!({"content": "not a message"})),
        ];
        assert!(project_messages(&events).is_empty());
    }

    #[test]
    fn test_state_sync_embeds_assistant_messages() {
        let events = vec![
            ev(0, "user.message", json!({"content": "Summarize"})),
            ev(
                1,
                "state.sync",
                json!({"messages": [
                    {"id": "m-1", "role": "user", "content": "Summarize"},
                    {"id": "m-2", "role": "assistant", "content": "Working on it"},
                    {"id": "m-3", "role": "assistant", "content": ""}
                ]}),
            ),
        ];
        let messages = project_messages(&events);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, "m-2");
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_later_snapshot_replaces_in_place() {
        let events = vec![
            ev(1, "state.sync", json!({"messages": [{"id": "a", "role": "assistant", "content": "Draft"}]})),
            ev(2, "assistant.message", json!({"content": "Separate delta"})),
            ev(3, "state.sync", json!({"state": {"messages": [{"id": "a", "role": "assistant", "content": "Final"}]}})),
        ];
        let messages = project_messages(&events);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "a");
        assert_eq!(messages[0].content, "Final");
        assert_eq!(messages[1].id, "2:assistant");
    }

    #[test]
    fn test_snapshot_without_ids_uses_position() {
        let events = vec![ev(
            7,
            "state.sync",
            json!({"messages": [{"role": "assistant", "content": [{"type": "text", "text": "Hi"}]}]}),
        )];
        let messages = project_messages(&events);

        assert_eq!(messages[0].id, "7:snapshot:0");
        assert_eq!(messages[0].content, "Hi");
    }

    #[test]
    fn test_malformed_snapshot_is_ignored() {
        let events = vec![
            ev(1, "state.sync", json!({"messages": "nope"})),
            ev(2, "user.message", json!({"content": "still here"})),
        ];
        let messages = project_messages(&events);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "still here");
    }
}
