use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::sync::Mutex;
use std::time::Duration;

use crate::publisher::{Ack, BrokerClient};

/// rdkafka-backed broker client. The producer is created on handshake and
/// confirmed with a metadata round trip.
pub struct KafkaBroker {
    config: ClientConfig,
    metadata_timeout: Duration,
    producer: Mutex<Option<FutureProducer>>,
}

impl KafkaBroker {
    pub fn new(bootstrap_servers: &str, metadata_timeout: Duration) -> Self {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", metadata_timeout.as_millis().to_string());
        Self { config, metadata_timeout, producer: Mutex::new(None) }
    }

    fn producer(&self) -> Result<FutureProducer> {
        self.producer
            .lock()
            .map_err(|_| anyhow!("kafka producer lock poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("kafka producer not connected"))
    }
}

#[async_trait]
impl BrokerClient for KafkaBroker {
    async fn handshake(&self) -> Result<()> {
        let producer: FutureProducer = self.config.create().context("failed to create kafka producer")?;
        let probe = producer.clone();
        let timeout = self.metadata_timeout;
        tokio::task::spawn_blocking(move || probe.client().fetch_metadata(None, timeout).map(|_| ()))
            .await
            .context("metadata probe task failed")?
            .context("kafka broker unreachable")?;
        *self.producer.lock().map_err(|_| anyhow!("kafka producer lock poisoned"))? = Some(producer);
        Ok(())
    }

    async fn send(&self, topic: &str, key: &str, payload: String) -> Result<Ack> {
        let producer = self.producer()?;
        let (partition, offset) = producer
            .send(FutureRecord::to(topic).payload(&payload).key(key), Duration::from_secs(0))
            .await
            .map_err(|(err, _)| anyhow!("{err}"))?;
        Ok(Ack { topic: topic.to_string(), partition, offset })
    }

    async fn close(&self) {
        let taken = self.producer.lock().ok().and_then(|mut slot| slot.take());
        if let Some(producer) = taken {
            let timeout = self.metadata_timeout;
            let _ = tokio::task::spawn_blocking(move || { let _ = producer.flush(timeout); }).await;
        }
    }
}
