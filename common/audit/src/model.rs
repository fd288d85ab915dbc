use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Payload attached to an audit event. Ordered so the encoded `data` string is stable.
pub type AuditPayload = serde_json::Map<String, serde_json::Value>;

pub const AUDIT_SOURCE: &str = "vehicle-order-service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub severity: Severity,
    pub event_type: String,
    pub payload: AuditPayload,
    pub emitted_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(severity: Severity, event_type: impl Into<String>, payload: AuditPayload) -> Self {
        Self { severity, event_type: event_type.into(), payload, emitted_at: Utc::now() }
    }

    pub fn info(event_type: impl Into<String>, payload: AuditPayload) -> Self { Self::new(Severity::Info, event_type, payload) }

    pub fn error(event_type: impl Into<String>, payload: AuditPayload) -> Self { Self::new(Severity::Error, event_type, payload) }
}

/// One physical log line as written to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: Severity,
    pub event_type: String,
    pub data: String,
    pub source: String,
}

impl LogEntry {
    /// Stamps the entry with the call time, not the event's emission time.
    pub fn from_event(event: &AuditEvent, source: &str) -> LogResult<Self> {
        let data = serde_json::to_string(&event.payload).map_err(|e| LogError::Serialization(e.to_string()))?;
        Ok(Self {
            timestamp: Utc::now().timestamp_millis(),
            level: event.severity,
            event_type: event.event_type.clone(),
            data,
            source: source.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState { Disconnected, Connecting, Ready, Failed }

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log sink connection failed: {0}")]
    ConnectionFailed(String),
    #[error("log append failed: {0}")]
    SendFailed(String),
    #[error("log sink timed out after {0:?}")]
    TimedOut(Duration),
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LogResult<T> = Result<T, LogError>;
