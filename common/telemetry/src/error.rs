use opentelemetry::metrics::MetricsError;
use opentelemetry::trace::TraceError;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Errors returned by [`TelemetryHandle::start`](crate::TelemetryHandle).
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry hooks are already active in this process")]
    AlreadyActive,
    #[error("telemetry hooks were already shut down in this process")]
    AlreadyShutDown,
    #[error("invalid instrumentation filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install trace pipeline: {0}")]
    Trace(#[from] TraceError),
    #[error("failed to install metrics pipeline: {0}")]
    Metrics(#[from] MetricsError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Errors returned when draining the telemetry pipeline.
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("telemetry handle was never started")]
    NotStarted,
    #[error("failed to flush spans: {0}")]
    Trace(#[from] TraceError),
    #[error("failed to flush metrics: {0}")]
    Metrics(#[from] MetricsError),
    #[error("telemetry flush task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
