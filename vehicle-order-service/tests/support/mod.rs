#![allow(dead_code)]

use async_trait::async_trait;
use common_audit::{AuditEvent, AuditLog, LogError, LogResult};
use common_observability::OrderMetrics;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use vehicle_order_service::{Ack, BrokerClient, OrderInput, OrderPipeline, OrderPublish, OrderRecord, PublishError};

pub const TOPIC: &str = "vehicle-orders";

pub fn jane() -> OrderInput {
    OrderInput {
        customer_name: "Jane Doe".into(),
        email: "jane@x.com".into(),
        model: "SUV".into(),
        color: "Blue".into(),
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
pub struct PublishCall {
    pub topic: String,
    pub key: String,
    pub record: OrderRecord,
}

/// Publisher double: records calls, optionally fails, optionally waits for a release.
#[derive(Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<PublishCall>>,
    fail_with: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingPublisher {
    pub fn new() -> Self { Self::default() }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Mutex::new(Some(message.to_string())), ..Self::default() }
    }

    pub fn gated(gate: Arc<Notify>) -> Self { Self { gate: Some(gate), ..Self::default() } }

    pub fn calls(&self) -> Vec<PublishCall> { self.calls.lock().unwrap().clone() }
}

#[async_trait]
impl OrderPublish for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, record: &OrderRecord) -> Result<Ack, PublishError> {
        self.calls.lock().unwrap().push(PublishCall { topic: topic.into(), key: key.into(), record: record.clone() });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(PublishError::SendFailed(message));
        }
        let offset = self.calls.lock().unwrap().len() as i64 - 1;
        Ok(Ack { topic: topic.into(), partition: 0, offset })
    }
}

/// Audit double: keeps every event it was handed, even when told to fail.
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
    fail: AtomicBool,
}

impl RecordingAudit {
    pub fn new() -> Self { Self::default() }

    pub fn failing() -> Self { Self { fail: AtomicBool::new(true), ..Self::default() } }

    pub fn events(&self) -> Vec<AuditEvent> { self.events.lock().unwrap().clone() }
}

#[async_trait]
impl AuditLog for RecordingAudit {
    async fn append(&self, event: AuditEvent) -> LogResult<()> {
        self.events.lock().unwrap().push(event);
        if self.fail.load(Ordering::SeqCst) {
            return Err(LogError::SendFailed("log sink unavailable".into()));
        }
        Ok(())
    }
}

pub fn pipeline(publisher: Arc<RecordingPublisher>, audit: Arc<RecordingAudit>) -> OrderPipeline {
    OrderPipeline::new(publisher, audit, Arc::new(OrderMetrics::new()), TOPIC)
}

/// Broker double for exercising the publisher's connection lifecycle.
#[derive(Default)]
pub struct FakeBroker {
    pub handshakes: AtomicUsize,
    pub closes: AtomicUsize,
    fail_handshakes: AtomicUsize,
    reject_sends: Mutex<Option<String>>,
    handshake_delay: Mutex<Option<std::time::Duration>>,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl FakeBroker {
    pub fn new() -> Self { Self::default() }

    pub fn fail_next_handshakes(&self, n: usize) { self.fail_handshakes.store(n, Ordering::SeqCst); }

    pub fn reject_sends(&self, message: &str) { *self.reject_sends.lock().unwrap() = Some(message.into()); }

    pub fn stall_handshake(&self, delay: std::time::Duration) { *self.handshake_delay.lock().unwrap() = Some(delay); }

    pub fn sent(&self) -> Vec<(String, String, String)> { self.sent.lock().unwrap().clone() }
}

#[async_trait]
impl BrokerClient for FakeBroker {
    async fn handshake(&self) -> anyhow::Result<()> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.handshake_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.fail_handshakes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_handshakes.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("broker unreachable");
        }
        Ok(())
    }

    async fn send(&self, topic: &str, key: &str, payload: String) -> anyhow::Result<Ack> {
        if let Some(message) = self.reject_sends.lock().unwrap().clone() {
            anyhow::bail!(message);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((topic.into(), key.into(), payload));
        Ok(Ack { topic: topic.into(), partition: 0, offset: sent.len() as i64 - 1 })
    }

    async fn close(&self) { self.closes.fetch_add(1, Ordering::SeqCst); }
}
