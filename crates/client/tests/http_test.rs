// Integration tests for HttpRunApi against a mock run API
//
// Run with: cargo test -p parley-client --test http_test

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parley_client::{ClientConfig, FileKeyValueStore, HttpRunApi};
use parley_core::{
    ApiError, ConversationScope, KeyValueStore, RunApi, RunStatus, SyncConfig, SyncController,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> HttpRunApi {
    HttpRunApi::new(&ClientConfig::new(server.uri()).with_api_key("secret")).unwrap()
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

#[tokio::test]
async fn test_create_run_sends_message_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj-1/conversations/conv-1/runs"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({"message": "Hello"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "run-1", "status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let run = api_for(&server)
        .create_run("proj-1", "conv-1", "Hello")
        .await
        .unwrap();

    assert_eq!(run.id, "run-1");
    assert_eq!(run.status, RunStatus::Queued);
}

#[tokio::test]
async fn test_append_message_returns_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/runs/run-1/messages"))
        .and(body_json(json!({"message": "Again"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let status = api_for(&server).append_message("run-1", "Again").await.unwrap();
    assert_eq!(status, RunStatus::Queued);
}

#[tokio::test]
async fn test_get_run_events_after_seq() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .and(query_param("after_seq", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {"seq": 4, "type": "assistant.message", "payload": {"content": "Hi"}},
                {"seq": 5, "type": "on_tool_start", "payload": {"name": "search"}}
            ],
            "next_seq": 6,
            "status": "running"
        })))
        .mount(&server)
        .await;

    let page = api_for(&server).get_run_events("run-1", Some(3)).await.unwrap();

    assert_eq!(page.events.len(), 2);
    assert_eq!(page.events[1].seq, 5);
    assert_eq!(page.next_seq, Some(6));
    assert_eq!(page.status, RunStatus::Running);
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/private"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/runs/busy/stop"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Run is not active"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(api.get_run("missing").await, Err(ApiError::NotFound));
    assert_eq!(api.get_run("private").await, Err(ApiError::Forbidden));
    assert_eq!(
        api.stop_run("busy").await,
        Err(ApiError::Api {
            status: 409,
            message: "Run is not active".to_string()
        })
    );
    assert!(matches!(api.get_run("garbled").await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let api = HttpRunApi::new(
        &ClientConfig::new("http://127.0.0.1:1").with_request_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    assert!(matches!(api.get_run("run-1").await, Err(ApiError::Transport(_))));
    assert!(matches!(api.stream_run("run-1", None).await, Err(ApiError::Stream(_))));
}

#[tokio::test]
async fn test_stalled_stream_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/stream"))
        .respond_with(sse("id: 0\ndata: {}\n\n").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let api = HttpRunApi::new(
        &ClientConfig::new(server.uri()).with_stream_idle_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(3), api.stream_run("run-1", None))
        .await
        .expect("stream open was not bounded by the idle timeout");
    assert!(matches!(result, Err(ApiError::Stream(_))));
}

#[tokio::test]
async fn test_stalled_stream_fails_over_to_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj-1/conversations/conv-1/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "run-1", "status": "queued"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"seq": 0, "type": "user.message", "payload": {"content": "Hello"}}],
            "next_seq": 1,
            "status": "running"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/stream"))
        .respond_with(sse("").set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let api = HttpRunApi::new(
        &ClientConfig::new(server.uri()).with_stream_idle_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let controller = SyncController::new(
        Arc::new(api),
        Arc::new(parley_core::InMemoryKeyValueStore::new()),
        SyncConfig::default().with_stream_retry_delay(Duration::from_millis(100)),
    )
    .unwrap();
    let mut views = controller.subscribe();

    controller
        .open(ConversationScope::new("proj-1", "conv-1"))
        .await
        .unwrap();
    controller.submit("Hello").await.unwrap();

    let view = tokio::time::timeout(Duration::from_secs(10), views.wait_for(|v| v.is_polling))
        .await
        .expect("stalled stream never escalated to polling")
        .unwrap()
        .clone();
    assert!(view.degraded);
    assert!(!view.is_streaming);
    assert_eq!(view.status, Some(RunStatus::Running));
}

#[tokio::test]
async fn test_stream_decodes_frames() {
    let server = MockServer::start().await;
    let body = concat!(
        "id: 0\n",
        "event: user.message\n",
        "data: {\"seq\": 0, \"type\": \"user.message\", \"payload\": {\"content\": \"Hello\"}}\n\n",
        ": keepalive\n\n",
        "id: 1\n",
        "event: assistant.message\n",
        "data: {\"content\": \"Hi\"}\n\n",
        "event: ping\n",
        "data: {}\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/stream"))
        .and(query_param("after_seq", "0"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let stream = api_for(&server).stream_run("run-1", Some(0)).await.unwrap();
    let events: Vec<_> = stream.collect().await;

    assert_eq!(events.len(), 2);
    let first = events[0].as_ref().unwrap();
    let second = events[1].as_ref().unwrap();
    assert_eq!(first.seq, 0);
    assert_eq!(first.payload["content"], "Hello");
    assert_eq!(second.seq, 1);
    assert_eq!(second.event_type, "assistant.message");
    assert_eq!(second.payload["content"], "Hi");
}

#[tokio::test]
async fn test_controller_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj-1/conversations/conv-1/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "run-1", "status": "queued"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"seq": 0, "type": "user.message", "payload": {"content": "Hello"}}],
            "next_seq": 1,
            "status": "running"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/stream"))
        .respond_with(sse(concat!(
            "id: 1\n",
            "event: assistant.message\n",
            "data: {\"content\": \"Hi, how can I help?\"}\n\n",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "run-1", "status": "completed"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileKeyValueStore::in_dir(dir.path()));
    let controller = SyncController::new(
        Arc::new(api_for(&server)),
        store.clone(),
        SyncConfig::default(),
    )
    .unwrap();
    let mut views = controller.subscribe();

    controller
        .open(ConversationScope::new("proj-1", "conv-1"))
        .await
        .unwrap();
    controller.submit("Hello").await.unwrap();

    let view = tokio::time::timeout(
        Duration::from_secs(10),
        views.wait_for(|v| v.status == Some(RunStatus::Completed)),
    )
    .await
    .expect("run did not complete")
    .unwrap()
    .clone();

    let contents: Vec<&str> = view.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello", "Hi, how can I help?"]);
    assert_eq!(view.after_seq, Some(1));
    assert!(!view.is_streaming);
    assert!(!view.degraded);
    assert_eq!(
        store.get("agentic-run:conv-1").await.unwrap().as_deref(),
        Some("run-1")
    );
}
