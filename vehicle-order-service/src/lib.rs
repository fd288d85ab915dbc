pub mod app;
pub mod catalog;
pub mod config;
pub mod form;
#[cfg(any(feature = "kafka", feature = "kafka-producer"))]
pub mod kafka;
pub mod order;
pub mod pipeline;
pub mod publisher;

pub use app::{build_router, AppState};
pub use config::OrderServiceConfig;
pub use form::OrderForm;
pub use order::{OrderInput, OrderRecord, ValidationError};
pub use pipeline::{OrderPipeline, SubmissionState, SubmitOutcome};
pub use publisher::{Ack, BrokerClient, OrderPublish, OrderPublisher, PublishError, PublisherConfig};
