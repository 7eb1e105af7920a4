use common_telemetry::{FlushError, ServiceIdentity, TelemetryConfig, TelemetryError, TelemetryHandle};
use lifecycle::Telemetry;

// Installing the subscriber is process-wide, so the whole start/shutdown lifecycle is
// exercised in a single test.
#[tokio::test]
async fn hooks_are_installed_once_per_process() {
    let identity = ServiceIdentity::new("checkout-api", "0.0.1");
    let mut first = TelemetryHandle::create(identity.clone(), TelemetryConfig::default());
    let mut second = TelemetryHandle::create(identity, TelemetryConfig::default());

    first.start().expect("first start installs the hooks");
    assert!(first.is_started());

    assert!(matches!(second.start(), Err(TelemetryError::AlreadyActive)));
    assert!(matches!(first.start(), Err(TelemetryError::AlreadyActive)));
    assert!(!second.is_started());

    tracing::info!("recorded while telemetry is active");
    first
        .shutdown()
        .await
        .expect("flush without exporters succeeds");
    assert!(!first.is_started());

    assert!(matches!(first.shutdown().await, Err(FlushError::NotStarted)));
    assert!(matches!(second.start(), Err(TelemetryError::AlreadyShutDown)));
}
