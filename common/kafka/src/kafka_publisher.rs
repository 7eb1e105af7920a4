use std::fmt;

use async_trait::async_trait;
use metrics::gauge;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, Producer};
use rdkafka::ClientConfig;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};

use crate::config::KafkaConfig;

pub struct KafkaContext;

impl rdkafka::ClientContext for KafkaContext {
    fn stats(&self, stats: rdkafka::Statistics) {
        gauge!("kafka_producer_callback_queue_depth").set(stats.replyq as f64);
        gauge!("kafka_producer_queue_depth").set(stats.msg_cnt as f64);
        gauge!("kafka_producer_queue_depth_limit").set(stats.msg_max as f64);
        gauge!("kafka_producer_queue_bytes").set(stats.msg_size as f64);
        gauge!("kafka_producer_queue_bytes_limit").set(stats.msg_size_max as f64);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublisherState {
    Unconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublisherState::Unconnected => "unconnected",
            PublisherState::Connecting => "connecting",
            PublisherState::Connected => "connected",
            PublisherState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("failed to connect to kafka brokers: {0}")]
    Kafka(#[from] KafkaError),
    #[error("kafka connect task failed: {0}")]
    Join(#[from] JoinError),
    #[error("publisher was already shut down")]
    Closed,
}

#[derive(Error, Debug)]
pub enum DisconnectError {
    #[error("failed to flush kafka producer: {0}")]
    Flush(#[from] KafkaError),
    #[error("kafka flush task failed: {0}")]
    Join(#[from] JoinError),
}

/// Owns the single outbound producer connection of the process:
/// `Unconnected -> Connecting -> Connected -> Closed`.
///
/// A failed `start` leaves the publisher `Unconnected` with no producer kept around.
/// `shutdown` is safe from any state and only does work when connected.
pub struct KafkaPublisher {
    config: KafkaConfig,
    producer: Option<FutureProducer<KafkaContext>>,
    state: PublisherState,
}

impl KafkaPublisher {
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config,
            producer: None,
            state: PublisherState::Unconnected,
        }
    }

    pub fn state(&self) -> PublisherState {
        self.state
    }

    /// The connected producer, for handlers that publish. `None` unless `Connected`.
    pub fn producer(&self) -> Option<&FutureProducer<KafkaContext>> {
        self.producer.as_ref()
    }
}

fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.kafka_hosts)
        .set("client.id", &config.kafka_client_id)
        .set("statistics.interval.ms", "10000")
        .set("linger.ms", config.kafka_producer_linger_ms.to_string())
        .set(
            "message.timeout.ms",
            config.kafka_message_timeout_ms.to_string(),
        )
        .set(
            "compression.codec",
            config.kafka_compression_codec.to_owned(),
        )
        .set(
            "queue.buffering.max.kbytes",
            (config.kafka_producer_queue_mib * 1024).to_string(),
        )
        .set(
            "queue.buffering.max.messages",
            config.kafka_producer_queue_messages.to_string(),
        );

    if config.kafka_tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };

    client_config
}

// Blocking: librdkafka answers the metadata request synchronously.
fn connect(config: &KafkaConfig) -> Result<FutureProducer<KafkaContext>, KafkaError> {
    let client_config = client_config(config);
    debug!("rdkafka configuration: {:?}", client_config);
    let producer: FutureProducer<KafkaContext> = client_config.create_with_context(KafkaContext)?;

    // "Ping" the Kafka brokers by requesting metadata
    let metadata = producer
        .client()
        .fetch_metadata(None, config.connect_timeout())?;
    info!(
        "Successfully connected to Kafka brokers. Found {} topics.",
        metadata.topics().len()
    );

    Ok(producer)
}

#[async_trait]
impl lifecycle::Publisher for KafkaPublisher {
    type ConnectError = ConnectError;
    type DisconnectError = DisconnectError;

    #[instrument(skip_all)]
    async fn start(&mut self) -> Result<(), ConnectError> {
        match self.state {
            PublisherState::Connected => return Ok(()),
            PublisherState::Closed => return Err(ConnectError::Closed),
            PublisherState::Unconnected | PublisherState::Connecting => {}
        }

        info!("connecting to Kafka brokers at {}...", self.config.kafka_hosts);
        self.state = PublisherState::Connecting;
        let config = self.config.clone();
        let result = tokio::task::spawn_blocking(move || connect(&config)).await;

        match result {
            Ok(Ok(producer)) => {
                self.producer = Some(producer);
                self.state = PublisherState::Connected;
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = PublisherState::Unconnected;
                warn!("Failed to fetch metadata from Kafka brokers: {:?}", e);
                Err(ConnectError::Kafka(e))
            }
            Err(e) => {
                self.state = PublisherState::Unconnected;
                Err(ConnectError::Join(e))
            }
        }
    }

    #[instrument(skip_all)]
    async fn shutdown(&mut self) -> Result<(), DisconnectError> {
        let Some(producer) = self.producer.take() else {
            debug!("kafka publisher not connected, nothing to flush");
            return Ok(());
        };
        self.state = PublisherState::Closed;

        let timeout = self.config.flush_timeout();
        let in_flight = producer.in_flight_count();
        info!(in_flight, "flushing kafka producer");
        // Flush blocks until delivery reports are in, and the producer is released on the same thread.
        let result = tokio::task::spawn_blocking(move || {
            let flushed = producer.flush(timeout);
            drop(producer);
            flushed
        })
        .await;

        match result {
            Ok(Ok(())) => {
                info!("kafka producer flushed and closed");
                Ok(())
            }
            Ok(Err(e)) => Err(DisconnectError::Flush(e)),
            Err(e) => Err(DisconnectError::Join(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_carries_producer_settings() {
        let config = KafkaConfig {
            kafka_hosts: "kafka:9092".to_string(),
            kafka_producer_queue_mib: 50,
            kafka_tls: true,
            ..Default::default()
        };
        let client_config = client_config(&config);

        assert_eq!(client_config.get("bootstrap.servers"), Some("kafka:9092"));
        assert_eq!(client_config.get("client.id"), Some("checkout-api"));
        assert_eq!(
            client_config.get("queue.buffering.max.kbytes"),
            Some("51200")
        );
        assert_eq!(client_config.get("security.protocol"), Some("ssl"));
    }

    #[test]
    fn new_publisher_is_unconnected() {
        let publisher = KafkaPublisher::new(KafkaConfig::default());
        assert_eq!(publisher.state(), PublisherState::Unconnected);
        assert!(publisher.producer().is_none());
    }
}
