use std::process::ExitCode;

use envconfig::Envconfig;
use tracing::{error, info, warn};

use checkout_api::config::Config;
use checkout_api::metrics::setup_metrics_recorder;
use checkout_api::router::router;
use checkout_api::routes::routes;
use checkout_api::server::HttpListener;
use common_kafka::KafkaPublisher;
use common_telemetry::{ServiceIdentity, TelemetryHandle};
use lifecycle::{OrchestratorBuilder, ReadinessHandler, ShutdownTrigger};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let identity = ServiceIdentity::from_config(&config.telemetry);
    let telemetry = TelemetryHandle::create(identity.clone(), config.telemetry.clone());
    let publisher = KafkaPublisher::new(config.kafka.clone());

    let trigger = ShutdownTrigger::new();
    let recorder_handle = if config.export_prometheus {
        match setup_metrics_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                eprintln!("Failed to install prometheus recorder: {e}");
                None
            }
        }
    } else {
        None
    };

    let app = router(
        &config.base_path,
        routes(identity.name(), identity.version()),
        ReadinessHandler::new(trigger.clone()),
        recorder_handle,
    );
    let listener = HttpListener::new(config.bind(), app);

    let orchestrator = OrchestratorBuilder::new(identity.name())
        .with_trigger(trigger)
        .with_step_timeout(config.step_timeout())
        .build(telemetry, publisher, listener);

    match orchestrator.run().await {
        Ok(report) => {
            info!(%report, "Gracefully shutting down from SIGINT (Ctrl-C)");
            ExitCode::SUCCESS
        }
        Err(lifecycle::OrchestratorError::TelemetryStart(e)) => {
            // No subscriber was installed, stderr is all there is
            eprintln!("telemetry start failed: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            match &e {
                lifecycle::OrchestratorError::Drain(_) => warn!("{e}"),
                _ => error!("{e}"),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
