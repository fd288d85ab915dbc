use async_trait::async_trait;
use common_audit::ConnectionState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::order::OrderRecord;

/// Broker acknowledgement for one delivered record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Display text is what the customer sees after `Error: `.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0}")]
    ConnectionFailed(String),
    #[error("{0}")]
    SendFailed(String),
    #[error("broker did not respond within {}ms", .0.as_millis())]
    TimedOut(Duration),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("could not encode order: {0}")]
    Serialization(String),
}

impl PublishError {
    /// Metric label for the failure class.
    pub fn reason(&self) -> &'static str {
        match self {
            PublishError::ConnectionFailed(_) => "connection",
            PublishError::SendFailed(_) | PublishError::Serialization(_) => "send",
            PublishError::TimedOut(_) => "timeout",
            PublishError::InvalidRequest(_) => "invalid",
        }
    }
}

/// Transport to the message broker.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Establishes the connection; called again only after a failure or a close.
    async fn handshake(&self) -> anyhow::Result<()>;
    async fn send(&self, topic: &str, key: &str, payload: String) -> anyhow::Result<Ack>;
    async fn close(&self) {}
}

#[async_trait]
impl<B: BrokerClient + ?Sized> BrokerClient for Arc<B> {
    async fn handshake(&self) -> anyhow::Result<()> { (**self).handshake().await }
    async fn send(&self, topic: &str, key: &str, payload: String) -> anyhow::Result<Ack> { (**self).send(topic, key, payload).await }
    async fn close(&self) { (**self).close().await }
}

#[async_trait]
pub trait OrderPublish: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, record: &OrderRecord) -> Result<Ack, PublishError>;
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self { Self { connect_timeout: Duration::from_secs(5), send_timeout: Duration::from_secs(5) } }
}

/// Publishes order records over one lazily established, reused broker connection.
pub struct OrderPublisher<B> {
    broker: B,
    config: PublisherConfig,
    state: Mutex<ConnectionState>,
}

impl<B: BrokerClient> OrderPublisher<B> {
    pub fn new(broker: B, config: PublisherConfig) -> Self {
        Self { broker, config, state: Mutex::new(ConnectionState::Disconnected) }
    }

    pub fn broker(&self) -> &B { &self.broker }

    pub async fn connection_state(&self) -> ConnectionState { *self.state.lock().await }

    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if *state != ConnectionState::Disconnected {
            self.broker.close().await;
            *state = ConnectionState::Disconnected;
            info!("broker connection closed");
        }
    }

    async fn ensure_connected(&self) -> Result<(), PublishError> {
        let mut state = self.state.lock().await;
        if *state == ConnectionState::Ready {
            return Ok(());
        }
        *state = ConnectionState::Connecting;
        match tokio::time::timeout(self.config.connect_timeout, self.broker.handshake()).await {
            Ok(Ok(())) => {
                *state = ConnectionState::Ready;
                info!("broker producer is ready");
                Ok(())
            }
            Ok(Err(e)) => {
                *state = ConnectionState::Failed;
                warn!(error = %e, "broker handshake failed");
                Err(PublishError::ConnectionFailed(format!("{e:#}")))
            }
            Err(_) => {
                *state = ConnectionState::Failed;
                warn!(timeout_ms = self.config.connect_timeout.as_millis() as u64, "broker handshake timed out");
                Err(PublishError::TimedOut(self.config.connect_timeout))
            }
        }
    }
}

#[async_trait]
impl<B: BrokerClient> OrderPublish for OrderPublisher<B> {
    async fn publish(&self, topic: &str, key: &str, record: &OrderRecord) -> Result<Ack, PublishError> {
        if topic.trim().is_empty() {
            return Err(PublishError::InvalidRequest("topic must not be empty".into()));
        }
        if key.trim().is_empty() {
            return Err(PublishError::InvalidRequest("message key must not be empty".into()));
        }
        self.ensure_connected().await?;

        let payload = serde_json::to_string(record).map_err(|e| PublishError::Serialization(e.to_string()))?;
        match tokio::time::timeout(self.config.send_timeout, self.broker.send(topic, key, payload)).await {
            Ok(Ok(ack)) => {
                debug!(topic = %ack.topic, partition = ack.partition, offset = ack.offset, key, "order record delivered");
                Ok(ack)
            }
            Ok(Err(e)) => Err(PublishError::SendFailed(format!("{e:#}"))),
            Err(_) => Err(PublishError::TimedOut(self.config.send_timeout)),
        }
    }
}
