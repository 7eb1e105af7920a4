use common_kafka::{ConnectError, KafkaConfig, KafkaPublisher, PublisherState};
use lifecycle::Publisher;
use rdkafka::mocking::MockCluster;

fn config_for(hosts: String) -> KafkaConfig {
    KafkaConfig {
        kafka_hosts: hosts,
        kafka_producer_linger_ms: 0,
        kafka_producer_queue_mib: 50,
        kafka_message_timeout_ms: 500,
        kafka_connect_timeout_ms: 2000,
        kafka_flush_timeout_ms: 2000,
        ..Default::default()
    }
}

#[tokio::test]
async fn connects_and_closes_against_mock_cluster() {
    let cluster = MockCluster::new(1).expect("failed to create mock brokers");
    let mut publisher = KafkaPublisher::new(config_for(cluster.bootstrap_servers()));

    publisher.start().await.expect("failed to connect");
    assert_eq!(publisher.state(), PublisherState::Connected);
    assert!(publisher.producer().is_some());

    // Starting an already connected publisher does not open a second connection.
    publisher.start().await.expect("start is idempotent once connected");

    publisher.shutdown().await.expect("failed to flush and close");
    assert_eq!(publisher.state(), PublisherState::Closed);
    assert!(publisher.producer().is_none());

    // A second shutdown is a no-op.
    publisher.shutdown().await.expect("shutdown from closed is a no-op");
    assert_eq!(publisher.state(), PublisherState::Closed);

    assert!(matches!(publisher.start().await, Err(ConnectError::Closed)));
}

#[tokio::test]
async fn unreachable_brokers_leave_publisher_unconnected() {
    // Nothing listens on port 1: every connection attempt is refused.
    let mut config = config_for("127.0.0.1:1".to_string());
    config.kafka_connect_timeout_ms = 500;
    let mut publisher = KafkaPublisher::new(config);

    let err = publisher
        .start()
        .await
        .expect_err("connect must fail without brokers");
    assert!(matches!(err, ConnectError::Kafka(_)));
    assert_eq!(publisher.state(), PublisherState::Unconnected);
    assert!(publisher.producer().is_none());

    // Shutdown after a failed start has nothing to release.
    publisher
        .shutdown()
        .await
        .expect("shutdown without connection is a no-op");
    assert_eq!(publisher.state(), PublisherState::Unconnected);
}

#[tokio::test]
async fn shutdown_before_start_is_a_noop() {
    let mut publisher = KafkaPublisher::new(KafkaConfig::default());
    publisher
        .shutdown()
        .await
        .expect("shutdown without connection is a no-op");
    assert_eq!(publisher.state(), PublisherState::Unconnected);
}
