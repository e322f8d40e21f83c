// Payload helpers
//
// Event payloads are loosely structured and differ between agent runtimes.
// Every accessor here returns Option and never panics; callers fall back to
// generic renderings when a field is missing or has an unexpected shape.

use serde_json::Value;

/// First non-empty string found under any of `keys`
pub(crate) fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
}

/// First present, non-null value under any of `keys`
pub(crate) fn first_value<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|v| !v.is_null())
}

/// Text of a message-like payload.
///
/// Content may be at `content` or `message.content`, either as a string or as
/// an array of parts carrying `text`. `text` is accepted as a last resort.
pub(crate) fn message_text(payload: &Value) -> Option<String> {
    payload
        .get("content")
        .and_then(content_text)
        .or_else(|| {
            payload
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(content_text)
        })
        .or_else(|| payload.get("text").and_then(content_text))
}

/// Text of a `content` value; whitespace-only text counts as absent
pub(crate) fn content_text(content: &Value) -> Option<String> {
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect::<String>(),
        _ => return None,
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Error text from `error` (string or `{message}`), then `message`
pub(crate) fn error_text(payload: &Value) -> Option<String> {
    match payload.get("error") {
        Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
        Some(obj @ Value::Object(_)) => {
            if let Some(msg) = first_str(obj, &["message", "detail"]) {
                return Some(msg.to_string());
            }
        }
        _ => {}
    }
    first_str(payload, &["message"]).map(str::to_string)
}

/// Strings that hold a JSON object or array are decoded; anything else is kept
pub(crate) fn decode_embedded_json(value: &Value) -> Value {
    if let Value::String(s) = value {
        let trimmed = s.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                return parsed;
            }
        }
    }
    value.clone()
}

/// Strings verbatim, everything else as compact JSON
pub(crate) fn render_raw(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Scalar rendered for a summary line
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `fetch_data` -> `Fetch data`, `total-results` -> `Total results`
pub(crate) fn humanize(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let joined = words.join(" ");

    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
