//! Two-phase shutdown coordination
//!
//! Phase one cancels the token every control loop polls once per iteration
//! and waits for the tracker to drain. Phase two triggers when the grace
//! period elapses first: in-flight loop iterations are abandoned and no
//! further persistence writes are attempted for them.

use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    tracker: TaskTracker,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(cancel: CancellationToken, tracker: TaskTracker, grace: Duration) -> Self {
        Self {
            cancel,
            tracker,
            grace,
        }
    }

    /// Run both phases; returns true when shutdown had to be forced
    pub async fn run(self) -> bool {
        info!(
            active = self.tracker.len(),
            "shutdown requested, cancelling control loops"
        );
        self.cancel.cancel();
        self.tracker.close();

        match timeout(self.grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("all control loops drained");
                false
            }
            Err(_) => {
                warn!(
                    abandoned = self.tracker.len(),
                    grace_secs = self.grace.as_secs(),
                    "grace period elapsed, forcing shutdown"
                );
                true
            }
        }
    }
}
