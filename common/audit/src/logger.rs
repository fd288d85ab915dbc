use crate::sink::{InputLogEvent, LogSink, PutLogEvents};
use crate::{AuditEvent, ConnectionState, LogEntry, LogError, LogResult, AUDIT_SOURCE};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Anything that can durably record an audit event.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, event: AuditEvent) -> LogResult<()>;
}

#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    pub log_group: String,
    pub source: String,
    pub timeout: Duration,
}

impl AuditLoggerConfig {
    pub fn new(log_group: impl Into<String>) -> Self {
        Self { log_group: log_group.into(), source: AUDIT_SOURCE.to_string(), timeout: Duration::from_secs(5) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self { self.timeout = timeout; self }
}

struct LoggerState {
    connection: ConnectionState,
    sequence_token: Option<String>,
}

/// Appends audit entries to a single log stream named for the life of the process.
///
/// The state lock is held for the whole append, so the sequencing token always
/// belongs to the previous completed append.
pub struct AuditLogger<S> {
    sink: S,
    config: AuditLoggerConfig,
    stream_name: String,
    state: Mutex<LoggerState>,
}

impl<S: LogSink> AuditLogger<S> {
    pub fn new(sink: S, config: AuditLoggerConfig) -> Self {
        let stream_name = format!("{}-{}", config.source, Utc::now().timestamp_millis());
        Self {
            sink,
            config,
            stream_name,
            state: Mutex::new(LoggerState { connection: ConnectionState::Disconnected, sequence_token: None }),
        }
    }

    pub fn stream_name(&self) -> &str { &self.stream_name }

    pub fn log_group(&self) -> &str { &self.config.log_group }

    pub async fn connection_state(&self) -> ConnectionState { self.state.lock().await.connection }

    pub async fn sequence_token(&self) -> Option<String> { self.state.lock().await.sequence_token.clone() }

    async fn ensure_connected(&self, state: &mut LoggerState) -> LogResult<()> {
        if state.connection == ConnectionState::Ready {
            return Ok(());
        }
        state.connection = ConnectionState::Connecting;
        let attempt = tokio::time::timeout(self.config.timeout, self.sink.connect(&self.config.log_group, &self.stream_name)).await;
        match attempt {
            Ok(Ok(())) => {
                state.connection = ConnectionState::Ready;
                info!(log_group = %self.config.log_group, log_stream = %self.stream_name, "audit log sink connected");
                Ok(())
            }
            Ok(Err(e)) => {
                state.connection = ConnectionState::Failed;
                Err(e)
            }
            Err(_) => {
                state.connection = ConnectionState::Failed;
                Err(LogError::TimedOut(self.config.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: LogSink> AuditLog for AuditLogger<S> {
    async fn append(&self, event: AuditEvent) -> LogResult<()> {
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state).await?;

        let entry = LogEntry::from_event(&event, &self.config.source)?;
        let message = serde_json::to_string(&entry).map_err(|e| LogError::Serialization(e.to_string()))?;
        let request = PutLogEvents {
            log_group_name: self.config.log_group.clone(),
            log_stream_name: self.stream_name.clone(),
            log_events: vec![InputLogEvent { timestamp: entry.timestamp, message }],
            sequence_token: state.sequence_token.clone(),
        };
        let ack = match tokio::time::timeout(self.config.timeout, self.sink.put_log_events(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(event_type = %entry.event_type, "audit append timed out");
                return Err(LogError::TimedOut(self.config.timeout));
            }
        };
        state.sequence_token = ack.next_sequence_token;
        debug!(level = %entry.level, event_type = %entry.event_type, "audit entry appended");
        Ok(())
    }
}
