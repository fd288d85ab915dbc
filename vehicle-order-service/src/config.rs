use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    pub kafka_bootstrap: String,
    pub order_topic: String,
    pub log_sink_url: String,
    pub log_group_name: String,
    pub log_sink_region: String,
    pub log_sink_token: Option<String>,
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl OrderServiceConfig {
    pub fn from_env() -> Result<Self> {
        let log_sink_url = env::var("LOG_SINK_URL").context("LOG_SINK_URL must be set")?;
        let kafka_bootstrap = env::var("KAFKA_BOOTSTRAP").unwrap_or_else(|_| "localhost:9092".to_string());
        let order_topic = env::var("ORDER_TOPIC").unwrap_or_else(|_| "vehicle-orders".to_string());
        let log_group_name = env::var("LOG_GROUP_NAME").unwrap_or_else(|_| "vehicle-ordering-frontend".to_string());
        let log_sink_region = env::var("LOG_SINK_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let log_sink_token = env::var("LOG_SINK_TOKEN").ok().filter(|v| !v.trim().is_empty());
        let connect_timeout_ms = env::var("CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5_000);
        let send_timeout_ms = env::var("SEND_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5_000);
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8086);

        Ok(Self {
            kafka_bootstrap,
            order_topic,
            log_sink_url,
            log_group_name,
            log_sink_region,
            log_sink_token,
            connect_timeout: Duration::from_millis(connect_timeout_ms.max(100)),
            send_timeout: Duration::from_millis(send_timeout_ms.max(100)),
            host,
            port,
        })
    }
}
