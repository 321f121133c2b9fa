//! Periodic background removal of expired durable records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::otp::storage::CredentialStore;
use crate::otp::time_utils;

/// Handle to the background expiry sweep task.
///
/// The task keeps running until [`shutdown`](SweepHandle::shutdown) is called
/// or the handle is dropped.
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the background sweep.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a task that removes expired records every `interval`.
///
/// Correctness never depends on this task: verification checks expiry on
/// every lookup. The sweep only bounds storage growth, so a failed pass is
/// logged and the task simply waits for the next tick.
pub(crate) fn spawn<S: CredentialStore + 'static>(
    storage: Arc<S>,
    interval: Duration,
) -> SweepHandle {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a freshly started
        // manager doesn't race its own initialization.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let now = match time_utils::current_timestamp() {
                Ok(now) => now,
                Err(e) => {
                    tracing::warn!(error = %e, "expiry sweep skipped: clock unavailable");
                    continue;
                }
            };
            match storage.delete_expired(now).await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(removed, "expiry sweep removed stale credentials");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "expiry sweep pass failed");
                }
            }
        }
    });

    SweepHandle { handle }
}
