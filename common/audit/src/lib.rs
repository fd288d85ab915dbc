pub mod logger;
pub mod model;
pub mod sink;

pub use logger::{AuditLog, AuditLogger, AuditLoggerConfig};
pub use model::{AuditEvent, AuditPayload, ConnectionState, LogEntry, LogError, LogResult, Severity, AUDIT_SOURCE};
pub use sink::{HttpLogSink, HttpLogSinkConfig, InputLogEvent, LogSink, MemoryLogSink, PutLogEvents, PutLogEventsAck};
