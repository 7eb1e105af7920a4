use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::TelemetryError;

const IDLE: u8 = 0;
const ACTIVE: u8 = 1;
const RETIRED: u8 = 2;

/// Process-wide state flag for the global instrumentation hooks: `idle -> active -> retired`.
/// Hooks can be installed at most once per process, and never by two handles at a time.
pub(crate) struct HookGuard {
    state: AtomicU8,
}

impl HookGuard {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Claim the hooks for the caller.
    pub fn activate(&self) -> Result<(), TelemetryError> {
        match self
            .state
            .compare_exchange(IDLE, ACTIVE, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(ACTIVE) => Err(TelemetryError::AlreadyActive),
            Err(_) => Err(TelemetryError::AlreadyShutDown),
        }
    }

    /// Give the claim back after a failed installation.
    pub fn abandon(&self) {
        // Only an active claim can be abandoned, a retired guard stays retired.
        _ = self
            .state
            .compare_exchange(ACTIVE, IDLE, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Mark the hooks as shut down for the rest of the process lifetime.
    pub fn retire(&self) {
        self.state.store(RETIRED, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::SeqCst) == ACTIVE
    }
}

impl Default for HookGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) static GLOBAL_HOOKS: HookGuard = HookGuard::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_activation_is_rejected() {
        let guard = HookGuard::new();
        guard.activate().expect("first activation");
        assert!(guard.is_active());
        assert!(matches!(
            guard.activate(),
            Err(TelemetryError::AlreadyActive)
        ));
    }

    #[test]
    fn abandoned_claim_can_be_retaken() {
        let guard = HookGuard::new();
        guard.activate().expect("first activation");
        guard.abandon();
        assert!(!guard.is_active());
        guard.activate().expect("activation after abandon");
    }

    #[test]
    fn retired_guard_never_reactivates() {
        let guard = HookGuard::new();
        guard.activate().expect("first activation");
        guard.retire();
        guard.abandon();
        assert!(!guard.is_active());
        assert!(matches!(
            guard.activate(),
            Err(TelemetryError::AlreadyShutDown)
        ));
    }
}
