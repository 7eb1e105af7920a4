use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct KafkaConfig {
    #[envconfig(default = "20")]
    pub kafka_producer_linger_ms: u32, // Maximum time between producer batches during low traffic

    #[envconfig(default = "400")]
    pub kafka_producer_queue_mib: u32, // Size of the in-memory producer queue in mebibytes

    #[envconfig(default = "10000000")]
    pub kafka_producer_queue_messages: u32, // Maximum number of messages in the in-memory producer queue

    #[envconfig(default = "20000")]
    pub kafka_message_timeout_ms: u32, // Time before we stop retrying producing a message: 20 seconds

    #[envconfig(default = "none")]
    pub kafka_compression_codec: String, // none, gzip, snappy, lz4, zstd

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "checkout-api")]
    pub kafka_client_id: String,

    #[envconfig(default = "10000")]
    pub kafka_connect_timeout_ms: u64, // How long the startup metadata "ping" may take

    #[envconfig(default = "30000")]
    pub kafka_flush_timeout_ms: u64, // How long shutdown waits for in-flight messages
}

impl KafkaConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_connect_timeout_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_flush_timeout_ms)
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            kafka_producer_linger_ms: 20,
            kafka_producer_queue_mib: 400,
            kafka_producer_queue_messages: 10_000_000,
            kafka_message_timeout_ms: 20_000,
            kafka_compression_codec: "none".to_string(),
            kafka_tls: false,
            kafka_hosts: "localhost:9092".to_string(),
            kafka_client_id: "checkout-api".to_string(),
            kafka_connect_timeout_ms: 10_000,
            kafka_flush_timeout_ms: 30_000,
        }
    }
}
