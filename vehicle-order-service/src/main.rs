use std::net::SocketAddr;
use std::sync::Arc;

use common_audit::{AuditLogger, AuditLoggerConfig, HttpLogSink, HttpLogSinkConfig};
use common_observability::OrderMetrics;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vehicle_order_service::kafka::KafkaBroker;
use vehicle_order_service::{build_router, AppState, OrderPipeline, OrderPublisher, OrderServiceConfig, PublisherConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = OrderServiceConfig::from_env()?;

    // Both connections are established lazily on the first submission.
    let broker = KafkaBroker::new(&config.kafka_bootstrap, config.connect_timeout);
    let publisher = OrderPublisher::new(broker, PublisherConfig {
        connect_timeout: config.connect_timeout,
        send_timeout: config.send_timeout,
    });
    let sink = HttpLogSink::new(HttpLogSinkConfig {
        endpoint: config.log_sink_url.clone(),
        region: config.log_sink_region.clone(),
        bearer_token: config.log_sink_token.clone(),
    });
    let audit = AuditLogger::new(sink, AuditLoggerConfig::new(config.log_group_name.clone()).with_timeout(config.send_timeout));
    info!(log_group = %audit.log_group(), log_stream = %audit.stream_name(), topic = %config.order_topic, "order pipeline configured");

    let pipeline = OrderPipeline::new(Arc::new(publisher), Arc::new(audit), Arc::new(OrderMetrics::new()), config.order_topic.clone());
    let app = build_router(AppState { pipeline: Arc::new(pipeline) });

    let ip: std::net::IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((ip, config.port));
    info!(%addr, "starting vehicle-order-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
