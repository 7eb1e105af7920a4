use tokio::task::JoinHandle;
use tracing::error;

use crate::trigger::ShutdownTrigger;

/// Subscribe to SIGINT and forward every delivery to `trigger`. Only the first one starts
/// draining; the listener keeps consuming later ones so a second Ctrl-C cannot kill the
/// process halfway through the teardown.
pub fn spawn_interrupt_listener(trigger: ShutdownTrigger) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for SIGINT");
                return;
            }
            trigger.fire("SIGINT");
        }
    })
}
