// HTTP run transport
//
// Implements RunApi against the run API:
// - request/response calls carry a per-request timeout
// - the live stream is a long-lived SSE response decoded frame by frame
// - a stream that stays silent past its idle timeout ends with a Stream error,
//   so a half-open connection escalates like any other stream failure
// - 404 maps to NotFound, 401/403 to Forbidden, other failures to Api

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use parley_core::{ApiError, RunApi, RunEventStream};
use parley_schemas::{
    AppendMessageRequest, AppendMessageResponse, CreateRunRequest, Run, RunEventsPage, RunStatus,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ClientConfig, ConfigError};
use crate::sse::decode_frame;

/// RunApi over HTTP with SSE for the live stream
#[derive(Debug, Clone)]
pub struct HttpRunApi {
    base_url: Url,
    api_key: Option<String>,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
    http: reqwest::Client,
}

impl HttpRunApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = Url::parse(&config.api_url)
            .map_err(|_| ConfigError::InvalidApiUrl(config.api_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl(config.api_url.clone()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            stream_idle_timeout: config.stream_idle_timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder.header(AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;
        let response = error_for_status(response).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(e.to_string()))
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(Method::POST, url).json(body))
            .await
    }
}

#[async_trait]
impl RunApi for HttpRunApi {
    async fn create_run(
        &self,
        project_id: &str,
        conversation_id: &str,
        message: &str,
    ) -> Result<Run, ApiError> {
        let url = self.url(&[
            "v1",
            "projects",
            project_id,
            "conversations",
            conversation_id,
            "runs",
        ]);
        let request = CreateRunRequest {
            message: message.to_string(),
        };
        self.post_json(url, &request).await
    }

    async fn append_message(&self, run_id: &str, message: &str) -> Result<RunStatus, ApiError> {
        let url = self.url(&["v1", "runs", run_id, "messages"]);
        let request = AppendMessageRequest {
            message: message.to_string(),
        };
        let response: AppendMessageResponse = self.post_json(url, &request).await?;
        Ok(response.status)
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, ApiError> {
        let url = self.url(&["v1", "runs", run_id]);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn get_run_events(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> Result<RunEventsPage, ApiError> {
        let mut url = self.url(&["v1", "runs", run_id, "events"]);
        if let Some(after_seq) = after_seq {
            url.query_pairs_mut()
                .append_pair("after_seq", &after_seq.to_string());
        }
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn stream_run(
        &self,
        run_id: &str,
        after_seq: Option<u64>,
    ) -> Result<RunEventStream, ApiError> {
        let mut url = self.url(&["v1", "runs", run_id, "stream"]);
        if let Some(after_seq) = after_seq {
            url.query_pairs_mut()
                .append_pair("after_seq", &after_seq.to_string());
        }

        let idle = self.stream_idle_timeout;
        let send = self
            .request(Method::GET, url)
            .header(ACCEPT, "text/event-stream")
            .send();
        let response = tokio::time::timeout(idle, send)
            .await
            .map_err(|_| ApiError::stream(idle_message(idle)))?
            .map_err(|e| ApiError::stream(e.to_string()))?;
        let response = error_for_status(response).await?;
        tracing::debug!(run_id = %run_id, "SSE connection established");

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::stream(e.to_string())));
        let events = with_idle_timeout(bytes, idle)
            .eventsource()
            .filter_map(|frame| {
                futures::future::ready(match frame {
                    Ok(frame) => decode_frame(&frame).map(Ok),
                    Err(EventStreamError::Transport(e)) => Some(Err(e)),
                    Err(e) => Some(Err(ApiError::stream(e.to_string()))),
                })
            });

        Ok(Box::pin(events))
    }

    async fn stop_run(&self, run_id: &str) -> Result<(), ApiError> {
        let url = self.url(&["v1", "runs", run_id, "stop"]);
        let response = self
            .request(Method::POST, url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;
        error_for_status(response).await?;
        Ok(())
    }
}

/// Ends `stream` with a Stream error once no item arrives within `idle`
fn with_idle_timeout<S, T>(stream: S, idle: Duration) -> impl Stream<Item = Result<T, ApiError>>
where
    S: Stream<Item = Result<T, ApiError>>,
{
    futures::stream::unfold(Some(Box::pin(stream)), move |inner| async move {
        let mut inner = inner?;
        match tokio::time::timeout(idle, inner.next()).await {
            Ok(Some(item)) => Some((item, Some(inner))),
            Ok(None) => None,
            Err(_) => Some((Err(ApiError::stream(idle_message(idle))), None)),
        }
    })
}

fn idle_message(idle: Duration) -> String {
    format!("no data received for {}ms", idle.as_millis())
}

async fn error_for_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}

/// `{"error": ...}` / `{"message": ...}` bodies, else the raw text
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    from_json.unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_escapes_segments() {
        let api = HttpRunApi::new(&ClientConfig::new("http://localhost:9000/api/")).unwrap();
        let url = api.url(&["v1", "runs", "run 1/x"]);
        assert_eq!(url.as_str(), "http://localhost:9000/api/v1/runs/run%201%2Fx");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": "Run is busy"}"#), "Run is busy");
        assert_eq!(error_message(r#"{"message": "nope"}"#), "nope");
        assert_eq!(error_message(" plain text \n"), "plain text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_silent_stream() {
        let source = futures::stream::iter(vec![Ok::<_, ApiError>(1u8)])
            .chain(futures::stream::pending());
        let mut stream = Box::pin(with_idle_timeout(source, Duration::from_secs(5)));

        assert_eq!(stream.next().await, Some(Ok(1)));
        assert_eq!(
            stream.next().await,
            Some(Err(ApiError::stream("no data received for 5000ms")))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_passes_through_errors_and_end() {
        let source = futures::stream::iter(vec![
            Ok(1u8),
            Err(ApiError::stream("reset")),
        ]);
        let items: Vec<_> = with_idle_timeout(source, Duration::from_secs(5))
            .collect()
            .await;

        assert_eq!(items, vec![Ok(1), Err(ApiError::stream("reset"))]);
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(HttpRunApi::new(&ClientConfig::new("ftp://example.com")).is_err());
    }
}
