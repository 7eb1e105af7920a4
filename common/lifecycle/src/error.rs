//! Orchestrator error types, mapped onto the process exit status by the entry point.

use thiserror::Error;

use crate::orchestrator::ShutdownReport;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`Orchestrator::run`](crate::Orchestrator::run).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Telemetry hooks could not be installed; nothing else was started.
    #[error("telemetry start failed: {0}")]
    TelemetryStart(#[source] BoxError),

    /// The publisher could not connect. Fatal: the listener was never opened.
    #[error("publisher connect failed: {0}")]
    Connect(#[source] BoxError),

    /// The listener could not be opened after the publisher connected.
    #[error("listener open failed: {0}")]
    Listen(#[source] BoxError),

    /// Both drain steps ran, at least one of them did not complete cleanly.
    #[error("shutdown completed with failures: {0}")]
    Drain(ShutdownReport),
}

impl OrchestratorError {
    /// Process exit status for this error. Every orchestrator failure is non-zero.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
