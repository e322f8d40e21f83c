// SSE frame decoding
//
// The stream endpoint sends one run event per frame. Servers differ in what
// they put in `data`:
// - a full RunEvent object (`{"seq", "type", "payload"}`)
// - the bare payload, with `seq` in the frame id and the type in the event name
// Keepalive frames and frames without a usable seq are skipped.

use eventsource_stream::Event;
use parley_schemas::RunEvent;
use serde_json::Value;

const KEEPALIVE_EVENTS: &[&str] = &["keepalive", "ping", "heartbeat"];
const DEFAULT_SSE_EVENT: &str = "message";

/// Decode one SSE frame; `None` means the frame carries no run event
pub fn decode_frame(frame: &Event) -> Option<RunEvent> {
    let data = frame.data.trim();
    if data.is_empty() || KEEPALIVE_EVENTS.contains(&frame.event.as_str()) {
        return None;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(event = %frame.event, error = %e, "Skipping non-JSON SSE frame");
            return None;
        }
    };

    if is_full_event(&value) {
        match serde_json::from_value::<RunEvent>(value) {
            Ok(event) => return Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed run event frame");
                return None;
            }
        }
    }

    let Ok(seq) = frame.id.trim().parse::<u64>() else {
        tracing::warn!(event = %frame.event, id = %frame.id, "Skipping SSE frame without seq");
        return None;
    };
    let event_type = if frame.event.is_empty() {
        DEFAULT_SSE_EVENT
    } else {
        frame.event.as_str()
    };

    Some(RunEvent::new(seq, event_type, value))
}

fn is_full_event(value: &Value) -> bool {
    value.get("seq").is_some_and(Value::is_u64) && value.get("type").is_some_and(Value::is_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(event: &str, id: &str, data: &str) -> Event {
        Event {
            event: event.to_string(),
            data: data.to_string(),
            id: id.to_string(),
            retry: None,
        }
    }

    #[test]
    fn test_full_event_frame() {
        let decoded = decode_frame(&frame(
            "message",
            "",
            r#"{"seq": 4, "type": "on_tool_start", "payload": {"name": "search"}}"#,
        ))
        .unwrap();

        assert_eq!(decoded.seq, 4);
        assert_eq!(decoded.event_type, "on_tool_start");
        assert_eq!(decoded.payload, json!({"name": "search"}));
    }

    #[test]
    fn test_bare_payload_frame() {
        let decoded = decode_frame(&frame(
            "assistant.message",
            "7",
            r#"{"content": "Hi"}"#,
        ))
        .unwrap();

        assert_eq!(decoded.seq, 7);
        assert_eq!(decoded.event_type, "assistant.message");
        assert_eq!(decoded.payload["content"], "Hi");
    }

    #[test]
    fn test_skipped_frames() {
        assert!(decode_frame(&frame("message", "1", "")).is_none());
        assert!(decode_frame(&frame("keepalive", "", "{}")).is_none());
        assert!(decode_frame(&frame("message", "1", "not json")).is_none());
        assert!(decode_frame(&frame("assistant.message", "", r#"{"content": "x"}"#)).is_none());
    }
}
