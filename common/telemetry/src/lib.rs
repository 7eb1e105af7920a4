//! Telemetry bootstrap: a named, versioned resource descriptor, OTLP exporters for trace
//! spans and periodic metrics, and the `tracing` instrumentation hooks, all behind one
//! start/stop-capable [`TelemetryHandle`].

mod config;
mod error;
mod guard;
mod handle;
mod identity;
mod instrumentation;

pub use config::TelemetryConfig;
pub use error::{FlushError, TelemetryError};
pub use handle::{TelemetryHandle, METRICS_EXPORT_INTERVAL};
pub use identity::ServiceIdentity;
pub use instrumentation::{Instrumentation, InstrumentationSet};
