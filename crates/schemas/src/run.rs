// Run domain types
//
// These types represent the server-side Run entity, its status, and the
// request/response bodies of the run API. Used by the sync engine and the
// HTTP transport.

use serde::{Deserialize, Serialize};

use crate::events::RunEvent;

/// Run status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl RunStatus {
    /// Completed, failed, and timed out runs see no further synchronization
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Timeout
        )
    }

    /// Queued or running
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Queued => write!(f, "queued"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Timeout => write!(f, "timeout"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(RunStatus::Queued),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "timeout" => Ok(RunStatus::Timeout),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// Run - one server-executed agent conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

/// Request to create a run for a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunRequest {
    pub message: String,
}

/// Request to append a user message to an existing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageResponse {
    pub status: RunStatus,
}

/// Catch-up response: events strictly after the requested sequence number,
/// ascending by `seq`, plus the run's current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEventsPage {
    #[serde(default)]
    pub events: Vec<RunEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_seq: Option<u64>,
    pub status: RunStatus,
}
