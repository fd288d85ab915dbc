use crate::{LogError, LogResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputLogEvent {
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEvents {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub log_events: Vec<InputLogEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsAck {
    #[serde(default)]
    pub next_sequence_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLogStream<'a> {
    log_group_name: &'a str,
    log_stream_name: &'a str,
}

/// Remote store for structured log lines.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Makes the named stream ready to accept events. Must tolerate an already existing stream.
    async fn connect(&self, log_group: &str, log_stream: &str) -> LogResult<()>;
    async fn put_log_events(&self, request: PutLogEvents) -> LogResult<PutLogEventsAck>;
}

#[async_trait]
impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    async fn connect(&self, log_group: &str, log_stream: &str) -> LogResult<()> { (**self).connect(log_group, log_stream).await }
    async fn put_log_events(&self, request: PutLogEvents) -> LogResult<PutLogEventsAck> { (**self).put_log_events(request).await }
}

#[derive(Debug, Clone)]
pub struct HttpLogSinkConfig {
    pub endpoint: String,
    pub region: String,
    pub bearer_token: Option<String>,
}

/// JSON-over-HTTP log sink speaking the put-log-events shape.
#[derive(Clone)]
pub struct HttpLogSink {
    client: Client,
    config: HttpLogSinkConfig,
}

impl HttpLogSink {
    pub fn new(config: HttpLogSinkConfig) -> Self { Self { client: Client::new(), config } }

    fn url(&self, path: &str) -> String { format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path) }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(path)).header("X-Log-Region", &self.config.region);
        if let Some(token) = &self.config.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl LogSink for HttpLogSink {
    async fn connect(&self, log_group: &str, log_stream: &str) -> LogResult<()> {
        let body = CreateLogStream { log_group_name: log_group, log_stream_name: log_stream };
        let resp = self.request("log-streams").json(&body).send().await
            .map_err(|e| LogError::ConnectionFailed(e.to_string()))?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }
        Err(LogError::ConnectionFailed(format!("log sink returned status {status}")))
    }

    async fn put_log_events(&self, request: PutLogEvents) -> LogResult<PutLogEventsAck> {
        let resp = self.request("log-events").json(&request).send().await
            .map_err(|e| LogError::SendFailed(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LogError::SendFailed(format!("log sink returned status {status}")));
        }
        let body = resp.bytes().await.map_err(|e| LogError::SendFailed(e.to_string()))?;
        if body.is_empty() {
            return Ok(PutLogEventsAck::default());
        }
        serde_json::from_slice(&body).map_err(|e| LogError::Serialization(e.to_string()))
    }
}

#[derive(Default)]
struct MemorySinkState {
    streams: Vec<(String, String)>,
    events: Vec<PutLogEvents>,
    connect_attempts: usize,
    fail_connects: usize,
    fail_puts: usize,
    issued: usize,
}

/// In-process sink that records every request. Clones share the same buffer.
///
/// Mirrors the remote behaviour of rejecting an append whose sequencing token
/// does not match the last token handed out.
#[derive(Clone, Default)]
pub struct MemoryLogSink {
    state: Arc<Mutex<MemorySinkState>>,
}

impl MemoryLogSink {
    pub fn new() -> Self { Self::default() }

    /// The next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: usize) { self.lock().fail_connects = n; }

    /// The next `n` appends fail.
    pub fn fail_next_puts(&self, n: usize) { self.lock().fail_puts = n; }

    pub fn streams(&self) -> Vec<(String, String)> { self.lock().streams.clone() }

    pub fn connect_attempts(&self) -> usize { self.lock().connect_attempts }

    pub fn requests(&self) -> Vec<PutLogEvents> { self.lock().events.clone() }

    pub fn messages(&self) -> Vec<String> {
        self.lock().events.iter().flat_map(|r| r.log_events.iter().map(|e| e.message.clone())).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn connect(&self, log_group: &str, log_stream: &str) -> LogResult<()> {
        let mut state = self.lock();
        state.connect_attempts += 1;
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(LogError::ConnectionFailed("sink unavailable".into()));
        }
        let key = (log_group.to_string(), log_stream.to_string());
        if !state.streams.contains(&key) {
            state.streams.push(key);
        }
        Ok(())
    }

    async fn put_log_events(&self, request: PutLogEvents) -> LogResult<PutLogEventsAck> {
        let mut state = self.lock();
        if state.fail_puts > 0 {
            state.fail_puts -= 1;
            return Err(LogError::SendFailed("sink rejected append".into()));
        }
        let expected = (state.issued > 0).then(|| format!("token-{}", state.issued));
        if request.sequence_token != expected {
            return Err(LogError::SendFailed(format!("invalid sequence token {:?}", request.sequence_token)));
        }
        state.issued += 1;
        state.events.push(request);
        Ok(PutLogEventsAck { next_sequence_token: Some(format!("token-{}", state.issued)) })
    }
}
