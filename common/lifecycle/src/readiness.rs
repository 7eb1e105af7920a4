//! K8s readiness probe handler.

use axum::http::StatusCode;

use crate::trigger::ShutdownTrigger;

/// Axum-compatible readiness probe; returns 200 while serving, 503 once draining has begun.
#[derive(Clone)]
pub struct ReadinessHandler {
    trigger: ShutdownTrigger,
}

impl ReadinessHandler {
    pub fn new(trigger: ShutdownTrigger) -> Self {
        Self { trigger }
    }

    /// Returns OK or SERVICE_UNAVAILABLE based on the shutdown trigger; no I/O.
    pub async fn check(&self) -> StatusCode {
        if self.trigger.is_fired() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }
}
