// Sync cursor
//
// Controller-owned position within the active run. `after_seq` is the highest
// seq confirmed merged and never decreases while the run is unchanged; `None`
// means nothing has been merged yet, so catch-up starts from the beginning.

use parley_schemas::RunStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCursor {
    pub run_id: Option<String>,
    pub status: Option<RunStatus>,
    pub after_seq: Option<u64>,
    pub stream_failure_count: u32,
    pub is_streaming: bool,
}

impl SyncCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor for a run that was just created or resumed
    pub fn for_run(run_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            run_id: Some(run_id.into()),
            status: Some(status),
            ..Self::default()
        }
    }

    /// Advance the high-water mark; lower values are ignored
    pub fn advance(&mut self, seq: u64) {
        self.after_seq = Some(self.after_seq.map_or(seq, |current| current.max(seq)));
    }

    pub fn record_stream_failure(&mut self) -> u32 {
        self.stream_failure_count = self.stream_failure_count.saturating_add(1);
        self.stream_failure_count
    }

    pub fn reset_failures(&mut self) {
        self.stream_failure_count = 0;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }

    /// Queued or running
    pub fn is_active(&self) -> bool {
        self.status.is_some_and(|s| s.is_active())
    }

    /// Polling is the fallback of record once the threshold is reached
    pub fn should_poll(&self, threshold: u32) -> bool {
        self.run_id.is_some()
            && self.is_active()
            && !self.is_streaming
            && self.stream_failure_count >= threshold
    }

    pub fn is_run(&self, run_id: &str) -> bool {
        self.run_id.as_deref() == Some(run_id)
    }
}
