//! Orchestrator: ordered startup, serving, and single-shot ordered teardown.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::component::{Listener, Publisher, Telemetry};
use crate::error::OrchestratorError;
use crate::metrics;
use crate::signals;
use crate::trigger::ShutdownTrigger;

/// Orchestrator state. `Aborted` and `Stopped` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    TelemetryReady,
    PublisherReady,
    Serving,
    Draining,
    Stopped,
    Aborted,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::TelemetryReady => "telemetry_ready",
            Phase::PublisherReady => "publisher_ready",
            Phase::Serving => "serving",
            Phase::Draining => "draining",
            Phase::Stopped => "stopped",
            Phase::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Teardown steps, always run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainStep {
    Telemetry,
    Publisher,
}

impl DrainStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainStep::Telemetry => "telemetry",
            DrainStep::Publisher => "publisher",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Failed(String),
    TimedOut(Duration),
}

impl StepOutcome {
    fn label(&self) -> &'static str {
        match self {
            StepOutcome::Completed => "completed",
            StepOutcome::Failed(_) => "failed",
            StepOutcome::TimedOut(_) => "timeout",
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Completed => f.write_str("completed"),
            StepOutcome::Failed(reason) => write!(f, "failed ({reason})"),
            StepOutcome::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

/// Outcome of every teardown step that was attempted, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub steps: Vec<(DrainStep, StepOutcome)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.steps
            .iter()
            .all(|(_, outcome)| *outcome == StepOutcome::Completed)
    }

    pub fn outcome(&self, step: DrainStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (step, outcome)) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", step.as_str(), outcome)?;
        }
        Ok(())
    }
}

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    name: String,
    trap_signals: bool,
    step_timeout: Option<Duration>,
    trigger: ShutdownTrigger,
}

impl OrchestratorBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            trap_signals: true,
            step_timeout: None,
            trigger: ShutdownTrigger::new(),
        }
    }

    /// Install the SIGINT listener once serving (default: true).
    pub fn with_trap_signals(mut self, trap_signals: bool) -> Self {
        self.trap_signals = trap_signals;
        self
    }

    /// Upper bound for each drain step. `None` waits for as long as the step takes.
    pub fn with_step_timeout(mut self, step_timeout: Option<Duration>) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Share an existing trigger, e.g. one already handed to the readiness probe.
    pub fn with_trigger(mut self, trigger: ShutdownTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn build<T, P, L>(self, telemetry: T, publisher: P, listener: L) -> Orchestrator<T, P, L>
    where
        T: Telemetry,
        P: Publisher,
        L: Listener,
    {
        Orchestrator {
            name: self.name,
            trap_signals: self.trap_signals,
            step_timeout: self.step_timeout,
            trigger: self.trigger,
            phase: Phase::Init,
            telemetry,
            publisher,
            listener,
        }
    }
}

/// Top-level driver. Exclusively owns the telemetry, publisher and listener handles and
/// sequences them: the listener never opens before the publisher is connected, and
/// teardown runs exactly once.
pub struct Orchestrator<T, P, L> {
    name: String,
    trap_signals: bool,
    step_timeout: Option<Duration>,
    trigger: ShutdownTrigger,
    phase: Phase,
    telemetry: T,
    publisher: P,
    listener: L,
}

impl<T, P, L> Orchestrator<T, P, L>
where
    T: Telemetry,
    P: Publisher,
    L: Listener,
{
    /// Drive the process from `Init` to a terminal phase.
    ///
    /// Returns the drain report on a clean `Stopped`. Every error maps to a non-zero exit
    /// status, see [`OrchestratorError::exit_code`].
    pub async fn run(mut self) -> Result<ShutdownReport, OrchestratorError> {
        if let Err(e) = self.telemetry.start() {
            error!(error = %e, "Lifecycle: telemetry start failed");
            self.transition(Phase::Aborted);
            return Err(OrchestratorError::TelemetryStart(Box::new(e)));
        }
        self.transition(Phase::TelemetryReady);

        if let Err(e) = self.publisher.start().await {
            error!(error = %e, "Lifecycle: publisher connect failed: {e}");
            self.transition(Phase::Aborted);
            // Nothing to close on the publisher side, but what telemetry has buffered so
            // far (this failure included) is still exported.
            let outcome = self.shutdown_telemetry().await;
            debug!(%outcome, "Lifecycle: telemetry flushed after connect failure");
            return Err(OrchestratorError::Connect(Box::new(e)));
        }
        self.transition(Phase::PublisherReady);

        let addr = match self.listener.open(self.trigger.token()).await {
            Ok(addr) => addr,
            Err(e) => {
                error!(error = %e, "Lifecycle: listener open failed");
                self.transition(Phase::Aborted);
                let report = self.teardown().await;
                debug!(%report, "Lifecycle: teardown after listener failure");
                return Err(OrchestratorError::Listen(Box::new(e)));
            }
        };
        info!(%addr, "Lifecycle: server is running at http://{addr}");
        self.transition(Phase::Serving);

        if self.trap_signals {
            signals::spawn_interrupt_listener(self.trigger.clone());
        }
        self.trigger.fired().await;

        self.transition(Phase::Draining);
        let report = self.teardown().await;
        self.transition(Phase::Stopped);

        if report.is_clean() {
            info!("Lifecycle: gracefully shut down");
            Ok(report)
        } else {
            warn!(%report, "Lifecycle: shut down with failures");
            Err(OrchestratorError::Drain(report))
        }
    }

    fn transition(&mut self, next: Phase) {
        debug!(from = %self.phase, to = %next, "Lifecycle: phase transition");
        metrics::emit_phase_transition(&self.name, next.as_str());
        self.phase = next;
    }

    /// Telemetry first so the rest of the sequence is still observable, then the publisher.
    /// A failing step never prevents the next one from running.
    async fn teardown(&mut self) -> ShutdownReport {
        let telemetry = self.shutdown_telemetry().await;
        let publisher = run_step(
            &self.name,
            DrainStep::Publisher,
            self.step_timeout,
            self.publisher.shutdown(),
        )
        .await;

        ShutdownReport {
            steps: vec![
                (DrainStep::Telemetry, telemetry),
                (DrainStep::Publisher, publisher),
            ],
        }
    }

    async fn shutdown_telemetry(&mut self) -> StepOutcome {
        run_step(
            &self.name,
            DrainStep::Telemetry,
            self.step_timeout,
            self.telemetry.shutdown(),
        )
        .await
    }
}

async fn run_step<F, E>(
    service_name: &str,
    step: DrainStep,
    timeout: Option<Duration>,
    fut: F,
) -> StepOutcome
where
    F: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    let start = Instant::now();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    };
    let outcome = match result {
        Ok(Ok(())) => StepOutcome::Completed,
        Ok(Err(e)) => StepOutcome::Failed(e.to_string()),
        Err(limit) => StepOutcome::TimedOut(limit),
    };

    let elapsed = start.elapsed();
    metrics::emit_drain_step(
        service_name,
        step.as_str(),
        outcome.label(),
        elapsed.as_secs_f64(),
    );
    match &outcome {
        StepOutcome::Completed => info!(
            step = step.as_str(),
            duration_secs = elapsed.as_secs_f64(),
            "Lifecycle: {} shutdown acknowledged",
            step.as_str()
        ),
        other => error!(
            step = step.as_str(),
            duration_secs = elapsed.as_secs_f64(),
            "Lifecycle: {} shutdown {}",
            step.as_str(),
            other
        ),
    }
    outcome
}
