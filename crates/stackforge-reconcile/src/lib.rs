//! stackforge-reconcile — the reconciliation engine.
//!
//! One reconciler per declared resource kind, each a single synchronous pass
//! over the cluster store: resolve the declared dependency, synthesize child
//! manifests, bind ownership, submit. A pass either completes (`Ready`),
//! fails permanently (`Failed`), or suspends with an explicit requeue delay
//! that the dispatcher honors by redelivering later — backoff is cooperative,
//! never an in-pass sleep.
//!
//! # Components
//!
//! - **`resolver`** — ternary dependency resolution (satisfied / pending /
//!   invalid), re-evaluated on every pass
//! - **`database`**, **`backend`**, **`frontend`** — the tier reconcilers
//! - **`dispatch`** — explicit kind→reconciler table driven by an event
//!   queue; stands in for the platform's watch delivery
//! - **`config`** — tunables (requeue delay)

pub mod backend;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod frontend;
pub mod resolver;

pub use backend::BackendReconciler;
pub use config::ReconcilerConfig;
pub use database::DatabaseReconciler;
pub use dispatch::{DispatchHandle, Dispatcher, Event};
pub use frontend::FrontendReconciler;
pub use resolver::{resolve, Resolution};

use std::time::Duration;

use stackforge_cluster::{ClusterError, ClusterStore};
use stackforge_core::{ReconcileError, ReconcileResult, ResourceKind, StackResource, StackStatus};

/// One reconcile pass for one resource kind.
///
/// Implementations are synchronous and stateless across passes; everything
/// they observe comes from the store, everything they decide goes back as
/// the returned status or error.
pub trait Reconciler: Send + Sync {
    /// The resource kind this reconciler handles.
    fn kind(&self) -> ResourceKind;

    /// Run one pass for `resource`.
    fn reconcile(
        &self,
        store: &ClusterStore,
        resource: &StackResource,
    ) -> ReconcileResult<StackStatus>;
}

/// Classify a store failure during child submission.
///
/// A `Conflict` (child name held by a different owner) cannot heal by
/// retrying; anything else is storage-level and worth another pass.
pub fn classify_submission(err: ClusterError, retry_delay: Duration) -> ReconcileError {
    if err.is_retryable() {
        ReconcileError::retry_submission(err.to_string(), retry_delay)
    } else {
        ReconcileError::permanent(format!("submission rejected: {err}"))
    }
}
