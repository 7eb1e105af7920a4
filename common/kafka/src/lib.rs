pub mod config;
pub mod kafka_publisher;

pub use config::KafkaConfig;
pub use kafka_publisher::{ConnectError, DisconnectError, KafkaPublisher, PublisherState};
