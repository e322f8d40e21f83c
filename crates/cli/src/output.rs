// Output formatting for CLI

use std::collections::HashSet;

use anyhow::Result;
use parley_core::{MessageRole, SyncView, TimelineMessage, ToolActivity};
use serde::Serialize;

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            OutputFormat::Yaml => {
                print!("{}", serde_yaml::to_string(value)?);
            }
            OutputFormat::Text => {
                // Text format is handled by each command
            }
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

pub fn format_message(message: &TimelineMessage) -> String {
    let label = match message.role {
        MessageRole::User => "You",
        MessageRole::Assistant => "Assistant",
        MessageRole::SystemNotice => "Notice",
    };
    format!("{}: {}", label, message.content)
}

/// Headline plus indented summary lines
pub fn format_tool(activity: &ToolActivity) -> String {
    let mut text = format!("  [{}] {}", activity.status, activity.headline);
    for line in &activity.summary_lines {
        text.push_str(&format!("\n      {}", line));
    }
    if let Some(error) = &activity.error {
        text.push_str(&format!("\n      Error: {}", error));
    }
    text
}

/// Prints timeline entries the first time their id shows up in a view
#[derive(Default)]
pub struct TimelinePrinter {
    seen_messages: HashSet<String>,
    seen_tools: HashSet<String>,
}

impl TimelinePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines for entries not printed before, in timeline order
    pub fn new_lines(&mut self, view: &SyncView) -> Vec<String> {
        let mut entries: Vec<(u64, String)> = Vec::new();

        for message in &view.messages {
            if self.seen_messages.insert(message.id.clone()) {
                entries.push((message_seq(message), format_message(message)));
            }
        }
        for activity in &view.tool_activity {
            if self.seen_tools.insert(activity.id.clone()) {
                entries.push((activity.seq, format_tool(activity)));
            }
        }

        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, line)| line).collect()
    }

    pub fn print_new(&mut self, view: &SyncView) {
        for line in self.new_lines(view) {
            println!("{}", line);
        }
    }
}

/// Messages without a seq-derived id sort after everything else seen so far
fn message_seq(message: &TimelineMessage) -> u64 {
    message
        .id
        .split(':')
        .next()
        .and_then(|seq| seq.parse().ok())
        .unwrap_or(u64::MAX)
}
