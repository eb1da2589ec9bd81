//! The reconcile error protocol.
//!
//! Two failure classes, as two variants: a permanent error means the
//! declared spec itself is invalid and retrying cannot help; a requeue means
//! a precondition is not yet observable and the dispatcher should redeliver
//! after the carried delay. Reconcilers signal backoff by returning, never by
//! sleeping in-pass.

use std::time::Duration;

use thiserror::Error;

use crate::status::StackPhase;

/// Result type alias for reconcile passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Error returned from a reconcile pass.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// Invalid declared state; never retried.
    #[error("{0}")]
    Permanent(String),

    /// Not-yet-satisfied precondition; the dispatcher redelivers after
    /// `delay`. `phase` records where the pass suspended.
    #[error("{reason} (retry in {delay:?})")]
    Requeue {
        phase: StackPhase,
        reason: String,
        delay: Duration,
    },
}

impl ReconcileError {
    /// Permanent configuration failure.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    /// Suspend in `DependencyWait`: the declared dependency is not
    /// observable yet.
    pub fn wait_for_dependency(reason: impl Into<String>, delay: Duration) -> Self {
        Self::Requeue {
            phase: StackPhase::DependencyWait,
            reason: reason.into(),
            delay,
        }
    }

    /// Suspend in `Submitting`: the cluster store failed transiently while
    /// children were being applied.
    pub fn retry_submission(reason: impl Into<String>, delay: Duration) -> Self {
        Self::Requeue {
            phase: StackPhase::Submitting,
            reason: reason.into(),
            delay,
        }
    }

    /// Whether the dispatcher should redeliver, and after how long.
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Self::Permanent(_) => None,
            Self::Requeue { delay, .. } => Some(*delay),
        }
    }
}
