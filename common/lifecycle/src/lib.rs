//! Process lifecycle for a service entry point: ordered startup of telemetry, publisher
//! and listener, a single-shot interrupt trigger, and ordered teardown (telemetry drained
//! first, then the publisher) before the process exits.

mod component;
mod error;
mod metrics;
mod orchestrator;
mod readiness;
mod signals;
mod trigger;

pub use component::{Listener, Publisher, Telemetry};
pub use error::{BoxError, OrchestratorError};
pub use orchestrator::{
    DrainStep, Orchestrator, OrchestratorBuilder, Phase, ShutdownReport, StepOutcome,
};
pub use readiness::ReadinessHandler;
pub use signals::spawn_interrupt_listener;
pub use trigger::ShutdownTrigger;
