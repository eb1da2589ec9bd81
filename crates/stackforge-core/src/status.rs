//! Reconcile status and phase vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Where a resource's reconciliation last got to.
///
/// A single pass walks `New → Synthesizing → (DependencyWait) → Submitting →
/// Ready`; the phase persisted on status is the furthest point reached.
/// `Failed` is terminal and reachable from any phase on a permanent error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPhase {
    New,
    Synthesizing,
    DependencyWait,
    Submitting,
    Ready,
    Failed,
}

impl std::fmt::Display for StackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Synthesizing => "synthesizing",
            Self::DependencyWait => "dependency_wait",
            Self::Submitting => "submitting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a reconcile pass, persisted on the parent resource.
///
/// This is how users observe progress and failure; reconcilers never report
/// through logs alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStatus {
    pub phase: StackPhase,
    pub message: String,
    /// Present only when the dispatcher will redeliver after a delay.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requeue_after_ms: Option<u64>,
}

impl StackStatus {
    /// Successful terminal status.
    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            phase: StackPhase::Ready,
            message: message.into(),
            requeue_after_ms: None,
        }
    }

    /// Status to persist for a failed or suspended pass.
    pub fn from_error(err: &ReconcileError) -> Self {
        match err {
            ReconcileError::Permanent(message) => Self {
                phase: StackPhase::Failed,
                message: message.clone(),
                requeue_after_ms: None,
            },
            ReconcileError::Requeue {
                phase,
                reason,
                delay,
            } => Self {
                phase: *phase,
                message: reason.clone(),
                requeue_after_ms: Some(delay.as_millis() as u64),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ready_status_has_no_requeue() {
        let status = StackStatus::ready("database provisioned");
        assert_eq!(status.phase, StackPhase::Ready);
        assert!(status.requeue_after_ms.is_none());
    }

    #[test]
    fn permanent_error_maps_to_failed() {
        let err = ReconcileError::permanent("unknown engine 'oracle'");
        let status = StackStatus::from_error(&err);
        assert_eq!(status.phase, StackPhase::Failed);
        assert_eq!(status.message, "unknown engine 'oracle'");
        assert!(status.requeue_after_ms.is_none());
    }

    #[test]
    fn requeue_error_keeps_phase_and_delay() {
        let err = ReconcileError::wait_for_dependency(
            "Database 'shop-db' not found",
            Duration::from_secs(5),
        );
        let status = StackStatus::from_error(&err);
        assert_eq!(status.phase, StackPhase::DependencyWait);
        assert_eq!(status.requeue_after_ms, Some(5000));
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&StackPhase::DependencyWait).unwrap();
        assert_eq!(json, r#""dependency_wait""#);
    }
}
