// Timeline projection
//
// Pure derivations of render-ready data from the event log. Both projections
// are recomputed from scratch on every merge; there is no incremental state,
// so projecting the same log twice always yields the same timeline.

mod messages;
mod payload;
mod tools;

use serde::Serialize;

use crate::event_log::EventLog;

pub use messages::{project_messages, MessageRole, TimelineMessage};
pub use tools::{
    project_tool_activity, tool_activity, truncate_text, SummaryLine, ToolActivity, ToolStatus,
    MAX_TOOL_TEXT_CHARS, TRUNCATION_MARKER,
};

/// Both projections of one event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub messages: Vec<TimelineMessage>,
    pub tool_activity: Vec<ToolActivity>,
}

/// Project messages and tool activity from the log
pub fn project(log: &EventLog) -> Timeline {
    Timeline {
        messages: project_messages(log.iter()),
        tool_activity: project_tool_activity(log.iter()),
    }
}
