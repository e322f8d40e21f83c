// Tool activity projection
//
// Each tool lifecycle event (start/end/error) yields exactly one ToolActivity
// keyed by its own `seq`. Start and end of the same invocation are separate
// entries: events carry no shared correlation id, so the latest event for a
// rendered slot supersedes the prior rendering at that position.
//
// Payloads vary by tool. Headlines come from per-tool templates with a
// humanized fallback, and summary lines keep only the facts that matter for
// the entry's status.

use parley_schemas::{EventKind, RunEvent};
use serde::Serialize;
use serde_json::Value;

use super::payload::{
    decode_embedded_json, error_text, first_str, first_value, humanize, render_raw, scalar_text,
};

/// Cap for raw input/output/error text
pub const MAX_TOOL_TEXT_CHARS: usize = 2000;

/// Appended to raw text cut at `MAX_TOOL_TEXT_CHARS`
pub const TRUNCATION_MARKER: &str = "… (truncated)";

const FALLBACK_TOOL_NAME: &str = "tool";
const FALLBACK_TOOL_ERROR: &str = "Tool failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Running => write!(f, "running"),
            ToolStatus::Completed => write!(f, "completed"),
            ToolStatus::Error => write!(f, "error"),
        }
    }
}

/// One fact about a tool call, rendered as `Label: value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

impl SummaryLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Render-ready view of one tool lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolActivity {
    pub id: String,
    pub seq: u64,
    pub tool_name: String,
    pub status: ToolStatus,
    pub headline: String,
    pub summary_lines: Vec<SummaryLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Project tool activity from events ascending by `seq`.
pub fn project_tool_activity<'a>(
    events: impl IntoIterator<Item = &'a RunEvent>,
) -> Vec<ToolActivity> {
    events.into_iter().filter_map(tool_activity).collect()
}

/// Tool activity for a single event, `None` for non-tool events
pub fn tool_activity(event: &RunEvent) -> Option<ToolActivity> {
    let status = match event.kind() {
        EventKind::ToolStart => ToolStatus::Running,
        EventKind::ToolEnd => ToolStatus::Completed,
        EventKind::ToolError => ToolStatus::Error,
        _ => return None,
    };

    let payload = &event.payload;
    let tool_name = first_str(payload, &["name", "tool", "tool_name"])
        .or_else(|| payload.get("data").and_then(|d| first_str(d, &["name"])))
        .unwrap_or(FALLBACK_TOOL_NAME)
        .to_string();

    let raw_input = first_value(payload, &["input", "args", "arguments"]);
    let raw_output = first_value(payload, &["output", "result"]);
    let input = raw_input.map(decode_embedded_json);
    let output = raw_output.map(decode_embedded_json);

    let error = match status {
        ToolStatus::Error => Some(error_text(payload).unwrap_or_else(|| FALLBACK_TOOL_ERROR.into())),
        _ => match payload.get("error") {
            Some(Value::Null) | None => None,
            Some(_) => error_text(payload),
        },
    };

    let facts = ToolFacts::collect(input.as_ref(), output.as_ref());
    let headline = headline(&tool_name, status, &facts);
    let summary_lines = facts.lines_for(status);

    Some(ToolActivity {
        id: format!("tool:{}", event.seq),
        seq: event.seq,
        tool_name,
        status,
        headline,
        summary_lines,
        input: raw_input.and_then(render_raw).map(|t| truncate_text(&t, MAX_TOOL_TEXT_CHARS)),
        output: raw_output
            .and_then(render_raw)
            .map(|t| truncate_text(&t, MAX_TOOL_TEXT_CHARS)),
        error: error.map(|t| truncate_text(&t, MAX_TOOL_TEXT_CHARS)),
    })
}

/// Cut `text` to `max_chars` characters, marking the cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

// ============================================================================
// Facts extracted from tool input/output
// ============================================================================

const QUERY_KEYS: &[&str] = &["query", "q", "search_query"];
const IDENTIFIER_KEYS: &[(&str, &str)] = &[
    ("conversation_id", "Conversation"),
    ("report_id", "Report"),
    ("project_id", "Project"),
];

#[derive(Debug, Default)]
struct ToolFacts {
    query: Option<String>,
    identifiers: Vec<SummaryLine>,
    limit: Option<String>,
    counters: Vec<SummaryLine>,
    count: Option<u64>,
}

impl ToolFacts {
    fn collect(input: Option<&Value>, output: Option<&Value>) -> Self {
        let mut facts = ToolFacts::default();

        if let Some(input) = input {
            facts.query = first_str(input, QUERY_KEYS).map(str::to_string);
            facts.identifiers = IDENTIFIER_KEYS
                .iter()
                .filter_map(|(key, label)| {
                    input
                        .get(*key)
                        .and_then(scalar_text)
                        .map(|value| SummaryLine::new(*label, value))
                })
                .collect();
            facts.limit = input
                .get("limit")
                .filter(|v| v.is_number())
                .and_then(scalar_text);
        }

        match output {
            Some(Value::Object(fields)) => {
                facts.counters = fields
                    .iter()
                    .filter(|(_, value)| value.is_number())
                    .filter_map(|(key, value)| {
                        scalar_text(value).map(|v| SummaryLine::new(humanize(key), v))
                    })
                    .collect();
                facts.count = ["count", "total"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_u64))
                    .or_else(|| {
                        ["results", "items"]
                            .iter()
                            .find_map(|key| fields.get(*key).and_then(Value::as_array))
                            .map(|items| items.len() as u64)
                    });
            }
            Some(Value::Array(items)) => {
                facts
                    .counters
                    .push(SummaryLine::new("Items", items.len().to_string()));
                facts.count = Some(items.len() as u64);
            }
            _ => {}
        }

        facts
    }

    fn query_line(&self) -> Option<SummaryLine> {
        self.query.as_ref().map(|q| SummaryLine::new("Query", q.clone()))
    }

    fn lines_for(&self, status: ToolStatus) -> Vec<SummaryLine> {
        let mut lines: Vec<SummaryLine> = self.query_line().into_iter().collect();

        match status {
            ToolStatus::Running => {
                lines.extend(self.identifiers.iter().cloned());
                if let Some(limit) = &self.limit {
                    lines.push(SummaryLine::new("Limit", limit.clone()));
                }
            }
            ToolStatus::Completed => lines.extend(self.counters.iter().cloned()),
            ToolStatus::Error => lines.extend(self.identifiers.iter().cloned()),
        }

        lines
    }
}

// ============================================================================
// Headline templates
// ============================================================================

/// Template with a `{query}`/`{count}` placeholder and a plain fallback
struct Headline {
    templated: &'static str,
    plain: &'static str,
}

struct ToolTemplate {
    name: &'static str,
    running: Headline,
    completed: Headline,
    error: Headline,
}

const fn fixed(text: &'static str) -> Headline {
    Headline {
        templated: text,
        plain: text,
    }
}

const TOOL_TEMPLATES: &[ToolTemplate] = &[
    ToolTemplate {
        name: "search",
        running: Headline {
            templated: "Searching for \"{query}\"",
            plain: "Searching",
        },
        completed: Headline {
            templated: "Found {count} results",
            plain: "Search finished",
        },
        error: fixed("Search failed"),
    },
    ToolTemplate {
        name: "search_conversations",
        running: Headline {
            templated: "Searching conversations for \"{query}\"",
            plain: "Searching conversations",
        },
        completed: Headline {
            templated: "Found {count} conversations",
            plain: "Conversation search finished",
        },
        error: fixed("Conversation search failed"),
    },
    ToolTemplate {
        name: "get_conversation",
        running: fixed("Opening conversation"),
        completed: fixed("Loaded conversation"),
        error: fixed("Could not load conversation"),
    },
    ToolTemplate {
        name: "get_transcript",
        running: fixed("Reading transcript"),
        completed: fixed("Read transcript"),
        error: fixed("Could not read transcript"),
    },
    ToolTemplate {
        name: "list_reports",
        running: fixed("Listing reports"),
        completed: Headline {
            templated: "Found {count} reports",
            plain: "Listed reports",
        },
        error: fixed("Could not list reports"),
    },
    ToolTemplate {
        name: "create_report",
        running: fixed("Creating report"),
        completed: fixed("Created report"),
        error: fixed("Could not create report"),
    },
    ToolTemplate {
        name: "update_report",
        running: fixed("Updating report"),
        completed: fixed("Updated report"),
        error: fixed("Could not update report"),
    },
];

fn headline(tool_name: &str, status: ToolStatus, facts: &ToolFacts) -> String {
    let Some(template) = TOOL_TEMPLATES.iter().find(|t| t.name == tool_name) else {
        return generic_headline(tool_name, status);
    };

    let headline = match status {
        ToolStatus::Running => &template.running,
        ToolStatus::Completed => &template.completed,
        ToolStatus::Error => &template.error,
    };
    render_headline(headline, facts)
}

fn render_headline(headline: &Headline, facts: &ToolFacts) -> String {
    let mut text = headline.templated.to_string();

    if text.contains("{query}") {
        match &facts.query {
            Some(query) => text = text.replace("{query}", query),
            None => return headline.plain.to_string(),
        }
    }
    if text.contains("{count}") {
        match facts.count {
            Some(count) => text = text.replace("{count}", &count.to_string()),
            None => return headline.plain.to_string(),
        }
    }

    text
}

fn generic_headline(tool_name: &str, status: ToolStatus) -> String {
    let mut name = humanize(tool_name);
    if name.is_empty() {
        name = humanize(FALLBACK_TOOL_NAME);
    }
    match status {
        ToolStatus::Running => format!("Running {}", name),
        ToolStatus::Completed => format!("{} finished", name),
        ToolStatus::Error => format!("{} failed", name),
    }
}
