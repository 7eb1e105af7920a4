pub(crate) const METRIC_PHASE_TRANSITIONS: &str = "lifecycle_phase_transitions_total";
pub(crate) const METRIC_DRAIN_STEP_DURATION: &str = "lifecycle_drain_step_duration_seconds";
pub(crate) const METRIC_DRAIN_STEP_RESULT: &str = "lifecycle_drain_step_result_total";

pub(crate) fn emit_phase_transition(service_name: &str, phase: &str) {
    metrics::counter!(
        METRIC_PHASE_TRANSITIONS,
        "service_name" => service_name.to_string(),
        "phase" => phase.to_string()
    )
    .increment(1);
}

pub(crate) fn emit_drain_step(service_name: &str, step: &str, result: &str, duration_secs: f64) {
    metrics::histogram!(
        METRIC_DRAIN_STEP_DURATION,
        "service_name" => service_name.to_string(),
        "step" => step.to_string(),
        "result" => result.to_string()
    )
    .record(duration_secs);
    metrics::counter!(
        METRIC_DRAIN_STEP_RESULT,
        "service_name" => service_name.to_string(),
        "step" => step.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}
