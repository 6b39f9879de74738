//! Progress reporting seam
//!
//! The orchestration core never prints directly; it narrates through this
//! callback so the CLI can style output (and drive a spinner during the
//! conflict wait) while tests capture or discard it.

use async_trait::async_trait;

/// Receives human-facing status updates from strategies and the monitor.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A one-line status message.
    async fn on_message(&self, message: &str);

    /// A warning that does not stop the operation (cleanup failures and
    /// other best-effort steps).
    async fn on_warning(&self, message: &str) {
        self.on_message(message).await;
    }

    /// An open-ended wait has begun (conflict resolution).
    async fn on_wait_started(&self, message: &str) {
        self.on_message(message).await;
    }

    /// Periodic update while waiting.
    async fn on_wait_tick(&self, message: &str) {
        self.on_message(message).await;
    }

    /// The wait ended (resolved, aborted, or timed out).
    async fn on_wait_finished(&self, message: &str) {
        self.on_message(message).await;
    }
}

/// Progress sink that discards everything. Used in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
