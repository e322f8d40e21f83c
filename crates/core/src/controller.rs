// Synchronization controller
//
// Drives one conversation's agentic run to completion over two unreliable
// transports: the live stream and the catch-up endpoint. Owns the sync
// cursor and event log, decides which transport is active, and publishes a
// render-ready SyncView after every change.
//
// Concurrency model:
// - open/submit/stop are serialized through one async operation lock
// - stream, retry, and poll tasks never take that lock; they apply their
//   batches under the state lock and drop results tagged with a previous
//   conversation generation or another run id
// - every background task owns a CancellationToken child of the controller's
//   shutdown token, so close/drop cancels all of them
// - the state lock is never held across an await point
//
// Status freshness: statuses fetched from get_run or catch-up carry the
// status epoch current when the request was issued. Submission responses
// advance the epoch, and a terminal status is never regressed by a fetch.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use parley_schemas::{RunEvent, RunEventsPage, RunStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::cursor::SyncCursor;
use crate::error::{ApiError, Result, SyncError};
use crate::event_log::EventLog;
use crate::persistence::RunPointers;
use crate::projection::{project, Timeline, TimelineMessage, ToolActivity};
use crate::traits::{KeyValueStore, RunApi};

// ============================================================================
// Public types
// ============================================================================

/// The conversation a controller is synchronizing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConversationScope {
    pub project_id: String,
    pub conversation_id: String,
}

impl ConversationScope {
    pub fn new(project_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

/// Render-ready snapshot of the controller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncView {
    pub conversation_id: Option<String>,
    pub run_id: Option<String>,
    /// `None` while idle
    pub status: Option<RunStatus>,
    pub after_seq: Option<u64>,
    pub messages: Vec<TimelineMessage>,
    pub tool_activity: Vec<ToolActivity>,
    pub is_streaming: bool,
    pub is_polling: bool,
    /// Live stream gave up; polling is the fallback of record
    pub degraded: bool,
    pub stop_requested: bool,
    pub can_submit: bool,
    pub can_stop: bool,
}

impl SyncView {
    pub fn is_idle(&self) -> bool {
        self.status.is_none()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }

    /// `idle` or the run status
    pub fn status_label(&self) -> String {
        self.status
            .map_or_else(|| "idle".to_string(), |s| s.to_string())
    }
}

// ============================================================================
// Internal state
// ============================================================================

/// Cancellation handle of one background task
#[derive(Debug)]
struct TaskSlot {
    id: u64,
    token: CancellationToken,
}

impl TaskSlot {
    fn cancel(self) {
        self.token.cancel();
    }
}

/// Identity of the run a background result belongs to
#[derive(Debug, Clone)]
struct RunTicket {
    generation: u64,
    run_id: String,
}

#[derive(Debug, Default)]
struct SyncState {
    scope: Option<ConversationScope>,
    /// Bumped on every conversation switch or close
    generation: u64,
    cursor: SyncCursor,
    log: EventLog,
    timeline: Timeline,
    status_epoch: u64,
    stop_requested: bool,
    degraded: bool,
    stream: Option<TaskSlot>,
    poller: Option<TaskSlot>,
    retry: Option<TaskSlot>,
    next_task_id: u64,
}

impl SyncState {
    fn is_current(&self, ticket: &RunTicket) -> bool {
        self.generation == ticket.generation && self.cursor.is_run(&ticket.run_id)
    }

    fn ticket(&self) -> Option<RunTicket> {
        self.cursor.run_id.as_ref().map(|run_id| RunTicket {
            generation: self.generation,
            run_id: run_id.clone(),
        })
    }

    fn new_slot(&mut self, shutdown: &CancellationToken) -> (TaskSlot, CancellationToken) {
        self.next_task_id += 1;
        let token = shutdown.child_token();
        let slot = TaskSlot {
            id: self.next_task_id,
            token: token.clone(),
        };
        (slot, token)
    }

    fn cancel_stream(&mut self) {
        if let Some(slot) = self.stream.take() {
            slot.cancel();
        }
        self.cursor.is_streaming = false;
    }

    fn cancel_poller(&mut self) {
        if let Some(slot) = self.poller.take() {
            slot.cancel();
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(slot) = self.retry.take() {
            slot.cancel();
        }
    }

    fn owns_stream(&self, task_id: u64) -> bool {
        self.stream.as_ref().is_some_and(|slot| slot.id == task_id)
    }

    fn cancel_all(&mut self) {
        self.cancel_stream();
        self.cancel_poller();
        self.cancel_retry();
    }

    /// Forget the run and its events, invalidating in-flight results
    fn reset(&mut self, scope: Option<ConversationScope>) {
        self.cancel_all();
        self.scope = scope;
        self.generation += 1;
        self.status_epoch += 1;
        self.cursor = SyncCursor::new();
        self.log.clear();
        self.timeline = Timeline::default();
        self.stop_requested = false;
        self.degraded = false;
    }

    /// Start tracking a run whose status came from a submission or resume
    fn adopt_run(&mut self, run_id: &str, status: RunStatus) {
        if !self.cursor.is_run(run_id) {
            self.cancel_all();
            self.cursor = SyncCursor::for_run(run_id, status);
            self.log.clear();
            self.timeline = Timeline::default();
        }
        self.set_status(status);
        self.status_epoch += 1;
        self.stop_requested = false;
        self.degraded = false;
        self.cursor.reset_failures();
    }

    fn set_status(&mut self, status: RunStatus) {
        self.cursor.status = Some(status);
        if status.is_terminal() {
            self.halt();
        }
    }

    /// Apply a fetched status unless it is stale or would regress a terminal one
    fn apply_fetched_status(&mut self, epoch: u64, status: RunStatus) {
        if epoch != self.status_epoch {
            debug!(%status, "Ignoring status from a stale fetch");
            return;
        }
        if self.cursor.is_terminal() {
            return;
        }
        self.set_status(status);
    }

    /// Merge a batch; returns whether anything changed
    fn apply_events(&mut self, events: Vec<RunEvent>) -> bool {
        let outcome = self.log.merge(events);

        for event in &outcome.new_events {
            if let Some(status) = event.kind().terminal_status() {
                self.set_status(status);
            }
        }
        if let Some(max_seq) = outcome.max_seq {
            self.cursor.advance(max_seq);
        }

        if outcome.is_empty() {
            return false;
        }
        self.timeline = project(&self.log);
        true
    }

    /// Terminal runs see no further transport activity
    fn halt(&mut self) {
        self.cancel_all();
        self.stop_requested = false;
    }

    fn view(&self) -> SyncView {
        let active = self.cursor.is_active();
        SyncView {
            conversation_id: self.scope.as_ref().map(|s| s.conversation_id.clone()),
            run_id: self.cursor.run_id.clone(),
            status: self.cursor.status,
            after_seq: self.cursor.after_seq,
            messages: self.timeline.messages.clone(),
            tool_activity: self.timeline.tool_activity.clone(),
            is_streaming: self.cursor.is_streaming,
            is_polling: self.poller.is_some(),
            degraded: self.degraded,
            stop_requested: self.stop_requested,
            can_submit: self.scope.is_some() && !active,
            can_stop: active && !self.stop_requested,
        }
    }
}

struct Inner {
    api: Arc<dyn RunApi>,
    pointers: RunPointers,
    config: SyncConfig,
    state: Mutex<SyncState>,
    ops: tokio::sync::Mutex<()>,
    view_tx: watch::Sender<SyncView>,
    shutdown: CancellationToken,
}

// ============================================================================
// SyncController
// ============================================================================

/// Synchronization controller for one open conversation view
///
/// Dropping the controller cancels its stream, poller, and pending retry.
pub struct SyncController {
    inner: Arc<Inner>,
}

impl SyncController {
    pub fn new(
        api: Arc<dyn RunApi>,
        store: Arc<dyn KeyValueStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (view_tx, _) = watch::channel(SyncView::default());

        Ok(Self {
            inner: Arc::new(Inner {
                api,
                pointers: RunPointers::new(store),
                config,
                state: Mutex::new(SyncState::default()),
                ops: tokio::sync::Mutex::new(()),
                view_tx,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Current snapshot
    pub fn view(&self) -> SyncView {
        self.inner.state.lock().view()
    }

    /// Receive a new snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.inner.view_tx.subscribe()
    }

    pub fn scope(&self) -> Option<ConversationScope> {
        self.inner.state.lock().scope.clone()
    }

    /// Open a conversation, replacing the current one, and resume its run.
    ///
    /// A stale run pointer (not found / forbidden) is cleared silently and the
    /// controller stays idle. Other failures leave the pointer in place.
    pub async fn open(&self, scope: ConversationScope) -> Result<()> {
        let _ops = self.inner.ops.lock().await;

        info!(
            project_id = %scope.project_id,
            conversation_id = %scope.conversation_id,
            "Opening conversation"
        );
        self.inner.state.lock().reset(Some(scope.clone()));
        self.inner.publish();

        self.inner.resume(&scope).await
    }

    /// Create a run with `message`, or append it to the finished run
    pub async fn submit(&self, message: &str) -> Result<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SyncError::EmptyMessage);
        }

        let _ops = self.inner.ops.lock().await;

        let (scope, generation, run_id) = {
            let state = self.inner.state.lock();
            let scope = state.scope.clone().ok_or(SyncError::NoConversation)?;
            if state.cursor.is_active() {
                return Err(if state.stop_requested {
                    SyncError::StopPending
                } else {
                    SyncError::RunInProgress
                });
            }
            (scope, state.generation, state.cursor.run_id.clone())
        };

        match run_id {
            None => self.inner.create(&scope, generation, message).await,
            Some(run_id) => {
                self.inner
                    .append(RunTicket { generation, run_id }, message)
                    .await
            }
        }
    }

    /// Ask the backend to stop the active run.
    ///
    /// The status is not forced locally; the terminal status arrives over the
    /// existing transports. Submissions stay disabled until then.
    pub async fn stop(&self) -> Result<()> {
        let _ops = self.inner.ops.lock().await;

        let ticket = {
            let state = self.inner.state.lock();
            if state.scope.is_none() {
                return Err(SyncError::NoConversation);
            }
            if !state.cursor.is_active() {
                return Err(SyncError::NotStoppable);
            }
            if state.stop_requested {
                return Ok(());
            }
            state.ticket().ok_or(SyncError::NotStoppable)?
        };

        self.inner.api.stop_run(&ticket.run_id).await?;
        info!(run_id = %ticket.run_id, "Stop requested");

        {
            let mut state = self.inner.state.lock();
            if state.is_current(&ticket) && state.cursor.is_active() {
                state.stop_requested = true;
            }
        }
        self.inner.publish();
        Ok(())
    }

    /// Close the conversation: cancel all transport activity and go idle
    pub fn close(&self) {
        self.inner.state.lock().reset(None);
        self.inner.publish();
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
        self.inner.state.lock().cancel_all();
    }
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("config", &self.inner.config)
            .field("view", &self.view())
            .finish()
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

impl Inner {
    fn publish(&self) {
        let view = self.state.lock().view();
        self.view_tx.send_replace(view);
    }

    async fn resume(self: &Arc<Self>, scope: &ConversationScope) -> Result<()> {
        let run_id = match self.pointers.load(&scope.conversation_id).await {
            Ok(Some(run_id)) => run_id,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(conversation_id = %scope.conversation_id, error = %e, "Failed to read run pointer");
                return Ok(());
            }
        };

        let generation = self.state.lock().generation;
        let run = match self.api.get_run(&run_id).await {
            Ok(run) => run,
            Err(e) if e.is_resumption_failure() => {
                info!(run_id = %run_id, error = %e, "Stored run is gone; clearing pointer");
                self.clear_pointer(&scope.conversation_id).await;
                return Ok(());
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Failed to resume run");
                return Err(e.into());
            }
        };

        let ticket = RunTicket {
            generation,
            run_id: run.id.clone(),
        };
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Ok(());
            }
            state.adopt_run(&run.id, run.status);
        }
        info!(run_id = %run.id, status = %run.status, "Resumed run");
        self.publish();

        self.catch_up(&ticket).await;
        self.start_stream(ticket);
        Ok(())
    }

    async fn create(
        self: &Arc<Self>,
        scope: &ConversationScope,
        generation: u64,
        message: &str,
    ) -> Result<()> {
        let run = self
            .api
            .create_run(&scope.project_id, &scope.conversation_id, message)
            .await?;
        info!(run_id = %run.id, status = %run.status, "Created run");

        if let Err(e) = self.pointers.save(&scope.conversation_id, &run.id).await {
            warn!(run_id = %run.id, error = %e, "Failed to persist run pointer");
        }

        {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(run_id = %run.id, "Conversation changed while creating run");
                return Ok(());
            }
            state.adopt_run(&run.id, run.status);
        }
        self.publish();

        let ticket = RunTicket {
            generation,
            run_id: run.id,
        };
        self.catch_up(&ticket).await;
        self.start_stream(ticket);
        Ok(())
    }

    async fn append(self: &Arc<Self>, ticket: RunTicket, message: &str) -> Result<()> {
        let status = self.api.append_message(&ticket.run_id, message).await?;
        info!(run_id = %ticket.run_id, %status, "Appended message");

        {
            let mut state = self.state.lock();
            if !state.is_current(&ticket) {
                return Ok(());
            }
            state.adopt_run(&ticket.run_id, status);
        }
        self.publish();

        self.catch_up(&ticket).await;
        self.start_stream(ticket);
        Ok(())
    }

    async fn clear_pointer(&self, conversation_id: &str) {
        if let Err(e) = self.pointers.clear(conversation_id).await {
            warn!(conversation_id = %conversation_id, error = %e, "Failed to clear run pointer");
        }
    }

    // ========================================================================
    // Catch-up
    // ========================================================================

    /// Fetch events after the cursor and merge them with the reported status
    async fn catch_up(&self, ticket: &RunTicket) {
        let (after_seq, epoch) = {
            let state = self.state.lock();
            if !state.is_current(ticket) {
                return;
            }
            (state.cursor.after_seq, state.status_epoch)
        };

        match self.api.get_run_events(&ticket.run_id, after_seq).await {
            Ok(page) => self.apply_page(ticket, epoch, page),
            Err(e) => warn!(run_id = %ticket.run_id, error = %e, "Catch-up failed"),
        }
    }

    fn apply_page(&self, ticket: &RunTicket, epoch: u64, page: RunEventsPage) {
        {
            let mut state = self.state.lock();
            if !state.is_current(ticket) {
                return;
            }
            let merged = page.events.len();
            state.apply_events(page.events);
            state.apply_fetched_status(epoch, page.status);
            debug!(
                run_id = %ticket.run_id,
                merged,
                after_seq = ?state.cursor.after_seq,
                "Applied catch-up page"
            );
        }
        self.publish();
    }

    // ========================================================================
    // Live stream
    // ========================================================================

    /// Open the live stream for a non-terminal run, replacing any other stream
    fn start_stream(self: &Arc<Self>, ticket: RunTicket) {
        let (task_id, token, after_seq) = {
            let mut state = self.state.lock();
            if !state.is_current(&ticket) || !state.cursor.is_active() {
                return;
            }
            state.cancel_all();
            let (slot, token) = state.new_slot(&self.shutdown);
            let task_id = slot.id;
            state.stream = Some(slot);
            state.cursor.is_streaming = true;
            (task_id, token, state.cursor.after_seq)
        };
        self.publish();

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_stream(ticket, task_id, after_seq, token).await;
        });
    }

    async fn run_stream(
        self: Arc<Self>,
        ticket: RunTicket,
        task_id: u64,
        after_seq: Option<u64>,
        token: CancellationToken,
    ) {
        info!(run_id = %ticket.run_id, after_seq = ?after_seq, "Opening live stream");

        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!(run_id = %ticket.run_id, "Live stream cancelled");
                return;
            }
            result = self.consume_stream(&ticket, task_id, after_seq) => result,
        };

        self.on_stream_end(ticket, task_id, result).await;
    }

    async fn consume_stream(
        &self,
        ticket: &RunTicket,
        task_id: u64,
        after_seq: Option<u64>,
    ) -> std::result::Result<(), ApiError> {
        let mut stream = self.api.stream_run(&ticket.run_id, after_seq).await?;

        while let Some(item) = stream.next().await {
            if !self.on_stream_event(ticket, task_id, item?) {
                break;
            }
        }
        Ok(())
    }

    /// Merge one live event; returns whether to keep reading
    fn on_stream_event(&self, ticket: &RunTicket, task_id: u64, event: RunEvent) -> bool {
        let keep_reading = {
            let mut state = self.state.lock();
            if !state.is_current(ticket) || !state.owns_stream(task_id) {
                return false;
            }
            let seq = event.seq;
            state.apply_events(vec![event]);
            state.cursor.reset_failures();
            state.degraded = false;
            debug!(run_id = %ticket.run_id, seq, "Stream event");
            !state.cursor.is_terminal()
        };
        self.publish();
        keep_reading
    }

    /// Release the stream slot, then escalate to retry or polling
    async fn on_stream_end(
        self: &Arc<Self>,
        ticket: RunTicket,
        task_id: u64,
        result: std::result::Result<(), ApiError>,
    ) {
        let finished = {
            let mut state = self.state.lock();
            if !state.is_current(&ticket) || !state.owns_stream(task_id) {
                return;
            }
            state.stream = None;
            state.cursor.is_streaming = false;
            state.cursor.is_terminal()
        };
        self.publish();

        if finished {
            info!(run_id = %ticket.run_id, "Run finished; live stream closed");
            return;
        }
        match &result {
            Ok(()) => info!(run_id = %ticket.run_id, "Live stream closed by server"),
            Err(e) => warn!(run_id = %ticket.run_id, error = %e, "Live stream failed"),
        }

        // Events missed while the stream was down land before a terminal status halts sync
        self.catch_up(&ticket).await;

        {
            let mut state = self.state.lock();
            if !state.is_current(&ticket) || !state.cursor.is_active() || state.stream.is_some() {
                return;
            }

            let failures = state.cursor.record_stream_failure();
            if failures >= self.config.stream_failure_threshold {
                warn!(
                    run_id = %ticket.run_id,
                    failures,
                    "Live stream unavailable; falling back to polling"
                );
                state.degraded = true;
                self.start_poller(&mut state, ticket);
            } else {
                debug!(run_id = %ticket.run_id, failures, "Scheduling stream retry");
                self.schedule_retry(&mut state, ticket);
            }
        }
        self.publish();
    }

    /// Catch up, then open a new stream after `stream_retry_delay`
    fn schedule_retry(self: &Arc<Self>, state: &mut SyncState, ticket: RunTicket) {
        state.cancel_retry();
        let (slot, token) = state.new_slot(&self.shutdown);
        let task_id = slot.id;
        state.retry = Some(slot);

        let inner = Arc::clone(self);
        let delay = self.config.stream_retry_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            inner.catch_up(&ticket).await;
            {
                let mut state = inner.state.lock();
                if token.is_cancelled() || !state.retry.as_ref().is_some_and(|s| s.id == task_id) {
                    return;
                }
                state.retry = None;
            }
            inner.start_stream(ticket);
        });
    }

    // ========================================================================
    // Polling fallback
    // ========================================================================

    fn start_poller(self: &Arc<Self>, state: &mut SyncState, ticket: RunTicket) {
        if state.poller.is_some() {
            return;
        }
        let (slot, token) = state.new_slot(&self.shutdown);
        let task_id = slot.id;
        state.poller = Some(slot);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_poller(ticket, task_id, token).await;
        });
    }

    async fn run_poller(self: Arc<Self>, ticket: RunTicket, task_id: u64, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let threshold = self.config.stream_failure_threshold;
        info!(run_id = %ticket.run_id, interval = ?self.config.poll_interval, "Polling started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(run_id = %ticket.run_id, "Polling cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    self.catch_up(&ticket).await;

                    let keep_polling = {
                        let state = self.state.lock();
                        state.is_current(&ticket) && state.cursor.should_poll(threshold)
                    };
                    if !keep_polling || token.is_cancelled() {
                        break;
                    }
                }
            }
        }

        {
            let mut state = self.state.lock();
            if state.poller.as_ref().is_some_and(|s| s.id == task_id) {
                state.poller = None;
            }
        }
        self.publish();
        info!(run_id = %ticket.run_id, "Polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn running_state() -> SyncState {
        let mut state = SyncState {
            scope: Some(ConversationScope::new("p", "c")),
            ..SyncState::default()
        };
        state.adopt_run("run-1", RunStatus::Running);
        state
    }

    #[test]
    fn test_fetched_status_never_regresses_terminal() {
        let mut state = running_state();
        let epoch = state.status_epoch;

        state.apply_events(vec![RunEvent::new(3, "run.timeout", json!({}))]);
        assert_eq!(state.cursor.status, Some(RunStatus::Timeout));

        state.apply_fetched_status(epoch, RunStatus::Running);
        assert_eq!(state.cursor.status, Some(RunStatus::Timeout));
    }

    #[test]
    fn test_stale_epoch_is_ignored() {
        let mut state = running_state();
        let stale = state.status_epoch;

        state.adopt_run("run-1", RunStatus::Queued);
        state.apply_fetched_status(stale, RunStatus::Completed);
        assert_eq!(state.cursor.status, Some(RunStatus::Queued));

        let fresh = state.status_epoch;
        state.apply_fetched_status(fresh, RunStatus::Running);
        assert_eq!(state.cursor.status, Some(RunStatus::Running));
    }

    #[test]
    fn test_replayed_failure_does_not_reterminate() {
        let mut state = running_state();
        let failed = RunEvent::new(1, "run.failed", json!({}));
        state.apply_events(vec![failed.clone()]);
        assert_eq!(state.cursor.status, Some(RunStatus::Failed));

        state.adopt_run("run-1", RunStatus::Queued);
        state.apply_events(vec![failed]);
        assert_eq!(state.cursor.status, Some(RunStatus::Queued));
    }

    #[test]
    fn test_apply_events_advances_cursor_and_projects() {
        let mut state = running_state();
        let changed = state.apply_events(vec![
            RunEvent::new(2, "assistant.message", json!({"content": "b"})),
            RunEvent::new(0, "user.message", json!({"content": "a"})),
        ]);

        assert!(changed);
        assert_eq!(state.cursor.after_seq, Some(2));
        assert_eq!(state.timeline.messages.len(), 2);
        assert!(!state.apply_events(Vec::new()));
    }

    #[test]
    fn test_view_flags() {
        let mut state = running_state();
        let view = state.view();
        assert!(view.can_stop);
        assert!(!view.can_submit);

        state.stop_requested = true;
        assert!(!state.view().can_stop);

        state.set_status(RunStatus::Completed);
        let view = state.view();
        assert!(view.can_submit);
        assert!(!view.stop_requested);
        assert_eq!(view.status_label(), "completed");

        state.reset(None);
        let view = state.view();
        assert!(!view.can_submit);
        assert_eq!(view.status_label(), "idle");
    }
}
