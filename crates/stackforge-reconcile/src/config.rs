//! Reconciler tunables.

use std::time::Duration;

/// Shared configuration for all tier reconcilers.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How long the dispatcher waits before redelivering after a pass
    /// suspends (dependency not found, transient submission failure).
    pub requeue_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            requeue_delay: Duration::from_secs(5),
        }
    }
}

impl ReconcilerConfig {
    /// Config with a custom requeue delay.
    pub fn with_requeue_delay(delay: Duration) -> Self {
        Self {
            requeue_delay: delay,
        }
    }
}
