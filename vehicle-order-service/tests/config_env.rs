use std::time::Duration;
use vehicle_order_service::OrderServiceConfig;

// Single test in this binary: it mutates process env.
#[test]
fn reads_env_with_defaults_and_floors() {
    std::env::remove_var("LOG_SINK_URL");
    assert!(OrderServiceConfig::from_env().is_err(), "log sink url is required");

    std::env::set_var("LOG_SINK_URL", "http://localhost:4566");
    std::env::set_var("CONNECT_TIMEOUT_MS", "5");
    std::env::set_var("LOG_SINK_TOKEN", "  ");
    std::env::remove_var("ORDER_TOPIC");
    std::env::remove_var("PORT");

    let config = OrderServiceConfig::from_env().expect("config");
    assert_eq!(config.order_topic, "vehicle-orders");
    assert_eq!(config.log_group_name, "vehicle-ordering-frontend");
    assert_eq!(config.connect_timeout, Duration::from_millis(100));
    assert_eq!(config.log_sink_token, None);
    assert_eq!(config.port, 8086);
}
