// In-memory implementations for embedding and testing
//
// These implementations keep all data in memory:
// - InMemoryKeyValueStore stands in for the durable pointer store
// - InMemoryRunApi is a scriptable run backend: tests push events to live
//   streams, change statuses, and inject failures, then assert on call counts

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_schemas::{Run, RunEvent, RunEventsPage, RunStatus, USER_MESSAGE};
use serde_json::json;
use tokio::sync::{mpsc, watch, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{ApiError, Result};
use crate::traits::{KeyValueStore, RunApi, RunEventStream};

// ============================================================================
// InMemoryKeyValueStore
// ============================================================================

/// In-memory key-value store
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// InMemoryRunApi
// ============================================================================

/// Remote operation, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    CreateRun,
    AppendMessage,
    GetRun,
    GetRunEvents,
    StreamRun,
    StopRun,
}

type StreamSender = mpsc::UnboundedSender<std::result::Result<RunEvent, ApiError>>;

#[derive(Debug)]
struct FakeRun {
    status: RunStatus,
    events: Vec<RunEvent>,
    streams: Vec<StreamSender>,
}

impl FakeRun {
    fn next_seq(&self) -> u64 {
        self.events.iter().map(|e| e.seq + 1).max().unwrap_or(0)
    }

    fn open_streams(&mut self) -> usize {
        self.streams.retain(|tx| !tx.is_closed());
        self.streams.len()
    }
}

#[derive(Debug, Default)]
struct FakeBackend {
    runs: HashMap<String, FakeRun>,
    next_run: u64,
    calls: HashMap<ApiCall, usize>,
    failures: HashMap<ApiCall, Vec<ApiError>>,
    forbidden: Vec<String>,
    stops: Vec<String>,
}

impl FakeBackend {
    fn record(&mut self, call: ApiCall) -> std::result::Result<(), ApiError> {
        *self.calls.entry(call).or_default() += 1;
        match self.failures.get_mut(&call) {
            Some(queue) if !queue.is_empty() => Err(queue.remove(0)),
            _ => Ok(()),
        }
    }

    fn run_mut(&mut self, run_id: &str) -> std::result::Result<&mut FakeRun, ApiError> {
        if self.forbidden.iter().any(|id| id == run_id) {
            return Err(ApiError::Forbidden);
        }
        self.runs.get_mut(run_id).ok_or(ApiError::NotFound)
    }
}

/// Scriptable in-memory run backend
///
/// Creating or appending records a `user.message` event, as the real backend
/// does. Events pushed with `push_event` are stored for catch-up and sent to
/// every open live stream; a new stream first replays stored events after
/// its `after_seq`.
#[derive(Debug, Clone)]
pub struct InMemoryRunApi {
    backend: Arc<Mutex<FakeBackend>>,
    stream_opens: watch::Sender<usize>,
}

impl Default for InMemoryRunApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRunApi {
    pub fn new() -> Self {
        let (stream_opens, _) = watch::channel(0);
        Self {
            backend: Arc::new(Mutex::new(FakeBackend::default())),
            stream_opens,
        }
    }

    /// Seed a run, as if created in an earlier session
    pub fn insert_run(&self, run_id: &str, status: RunStatus, events: Vec<RunEvent>) {
        self.backend.lock().runs.insert(
            run_id.to_string(),
            FakeRun {
                status,
                events,
                streams: Vec::new(),
            },
        );
    }

    /// Store an event and deliver it to every open stream of the run
    pub fn push_event(&self, run_id: &str, event: RunEvent) {
        let mut backend = self.backend.lock();
        if let Some(run) = backend.runs.get_mut(run_id) {
            run.events.retain(|e| e.seq != event.seq);
            run.events.push(event.clone());
            run.events.sort_by_key(|e| e.seq);
            run.streams.retain(|tx| tx.send(Ok(event.clone())).is_ok());
        }
    }

    /// Deliver an event to open streams without storing it for catch-up
    pub fn stream_only_event(&self, run_id: &str, event: RunEvent) {
        let mut backend = self.backend.lock();
        if let Some(run) = backend.runs.get_mut(run_id) {
            run.streams.retain(|tx| tx.send(Ok(event.clone())).is_ok());
        }
    }

    /// Store an event without delivering it to open streams
    pub fn record_event(&self, run_id: &str, event: RunEvent) {
        let mut backend = self.backend.lock();
        if let Some(run) = backend.runs.get_mut(run_id) {
            run.events.retain(|e| e.seq != event.seq);
            run.events.push(event);
            run.events.sort_by_key(|e| e.seq);
        }
    }

    pub fn set_status(&self, run_id: &str, status: RunStatus) {
        if let Some(run) = self.backend.lock().runs.get_mut(run_id) {
            run.status = status;
        }
    }

    pub fn status(&self, run_id: &str) -> Option<RunStatus> {
        self.backend.lock().runs.get(run_id).map(|r| r.status)
    }

    /// End every open stream of the run cleanly
    pub fn close_streams(&self, run_id: &str) {
        if let Some(run) = self.backend.lock().runs.get_mut(run_id) {
            run.streams.clear();
        }
    }

    /// Break every open stream of the run with an error
    pub fn break_streams(&self, run_id: &str, error: ApiError) {
        if let Some(run) = self.backend.lock().runs.get_mut(run_id) {
            for tx in run.streams.drain(..) {
                let _ = tx.send(Err(error.clone()));
            }
        }
    }

    /// Live streams the client still holds open
    pub fn open_streams(&self, run_id: &str) -> usize {
        self.backend
            .lock()
            .runs
            .get_mut(run_id)
            .map_or(0, |run| run.open_streams())
    }

    /// Queue an error for the next call of `call`
    pub fn fail_next(&self, call: ApiCall, error: ApiError) {
        self.backend
            .lock()
            .failures
            .entry(call)
            .or_default()
            .push(error);
    }

    /// Every access to the run is answered with 403
    pub fn forbid(&self, run_id: &str) {
        self.backend.lock().forbidden.push(run_id.to_string());
    }

    pub fn calls(&self, call: ApiCall) -> usize {
        self.backend.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// Run ids that received a stop request
    pub fn stop_requests(&self) -> Vec<String> {
        self.backend.lock().stops.clone()
    }

    /// Wait until at least `count` streams have been opened in total
    pub async fn wait_for_stream_opens(&self, count: usize) {
        let mut rx = self.stream_opens.subscribe();
        let _ = rx.wait_for(|opened| *opened >= count).await;
    }

    fn append_user_message(run: &mut FakeRun, message: &str) {
        let event = RunEvent::new(run.next_seq(), USER_MESSAGE, json!({ "content": message }));
        run.events.push(event.clone());
        run.streams.retain(|tx| tx.send(Ok(event.clone())).is_ok());
    }
}

#[async_trait]
impl RunApi for InMemoryRunApi {
    async fn create_run(
        &self,
        _project_id: &str,
        _conversation_id: &str,
        message: &str,
    ) -> std::result::Result<Run, ApiError> {
        let mut backend = self.backend.lock();
        backend.record(ApiCall::CreateRun)?;

        backend.next_run += 1;
        let id = format!("run-{}", backend.next_run);
        let mut run = FakeRun {
            status: RunStatus::Queued,
            events: Vec::new(),
            streams: Vec::new(),
        };
        Self::append_user_message(&mut run, message);
        backend.runs.insert(id.clone(), run);

        Ok(Run {
            id,
            status: RunStatus::Queued,
        })
    }

    async fn append_message(
        &self,
        run_id: &str,
        message: &str,
    ) -> std::result::Result<RunStatus, ApiError> {
        let mut backend = self.backend.lock();
        backend.record(ApiCall::AppendMessage)?;

        let run = backend.run_mut(run_id)?;
        run.status = RunStatus::Queued;
        Self::append_user_message(run, message);
        Ok(run.status)
    }

    async fn get_run(&self, run_id: &str) -> std::result::Result<Run, ApiError> {
        let mut backend = self.backend.lock();
        backend.record(ApiCall::GetRun)?;

        let run = backend.run_mut(run_id)?;
        Ok(Run {
            id: run_id.to_string(),
            status: run.status,
        })
    }

    async fn get_run_events(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> std::result::Result<RunEventsPage, ApiError> {
        let mut backend = self.backend.lock();
        backend.record(ApiCall::GetRunEvents)?;

        let run = backend.run_mut(run_id)?;
        let events: Vec<RunEvent> = run
            .events
            .iter()
            .filter(|e| after_seq.map_or(true, |after| e.seq > after))
            .cloned()
            .collect();
        let next_seq = events.last().map(|e| e.seq + 1).or(after_seq.map(|s| s + 1));

        Ok(RunEventsPage {
            events,
            next_seq,
            status: run.status,
        })
    }

    async fn stream_run(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> std::result::Result<RunEventStream, ApiError> {
        let stream = {
            let mut backend = self.backend.lock();
            backend.record(ApiCall::StreamRun)?;

            let run = backend.run_mut(run_id)?;
            let (tx, rx) = mpsc::unbounded_channel();
            for event in run
                .events
                .iter()
                .filter(|e| after_seq.map_or(true, |after| e.seq > after))
            {
                let _ = tx.send(Ok(event.clone()));
            }
            run.streams.push(tx);
            UnboundedReceiverStream::new(rx)
        };

        self.stream_opens.send_modify(|opened| *opened += 1);
        Ok(Box::pin(stream))
    }

    async fn stop_run(&self, run_id: &str) -> std::result::Result<(), ApiError> {
        let mut backend = self.backend.lock();
        backend.record(ApiCall::StopRun)?;

        backend.run_mut(run_id)?;
        backend.stops.push(run_id.to_string());
        Ok(())
    }
}
