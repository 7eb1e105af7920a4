//! Single-shot shutdown trigger shared between the signal listener, the orchestrator and
//! the readiness probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{info, warn};

/// Clone-able trigger for the `Serving -> Draining` transition. Only the first
/// [`fire`](ShutdownTrigger::fire) counts; later calls are logged and ignored, so repeated
/// interrupts never re-enter the teardown sequence.
#[derive(Clone, Default)]
pub struct ShutdownTrigger {
    fired: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request draining. Returns true only for the call that actually triggered it.
    pub fn fire(&self, reason: &str) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!(reason, "Lifecycle: already draining, ignoring shutdown request");
            return false;
        }
        info!(reason, "Lifecycle: shutdown requested");
        self.token.cancel();
        true
    }

    /// True once draining has been requested.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Future that resolves when draining has been requested.
    pub fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token cancelled when draining begins; hand it to anything that must stop accepting work.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_fire_counts() {
        let trigger = ShutdownTrigger::new();
        let clone = trigger.clone();

        assert!(!trigger.is_fired());
        assert!(clone.fire("SIGINT"));
        assert!(!trigger.fire("SIGINT"));
        assert!(trigger.is_fired());
        assert!(trigger.token().is_cancelled());
    }

    #[tokio::test]
    async fn fired_resolves_for_every_clone() {
        let trigger = ShutdownTrigger::new();
        let waiter = trigger.clone();
        let task = tokio::spawn(async move { waiter.fired().await });

        trigger.fire("test");
        task.await.expect("waiter task panicked");
    }
}
