//! Dependency resolution.
//!
//! A dependent tier names its dependency by kind + name; resolution asks the
//! store whether that resource exists right now. No caching: every pass
//! re-resolves, so a dependency that disappears before its dependent is
//! ready is re-detected as pending on the next pass.
//!
//! Existence, not readiness, satisfies a dependency: the injected connection
//! values only need the dependency's stable service name, and at-least-once
//! redelivery converges the rest.

use stackforge_cluster::{ClusterResult, ClusterStore};
use stackforge_core::{is_valid_name, ResourceKind, StackResource};

/// Outcome of resolving one dependency reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The referenced resource exists; carries it so the dependent can read
    /// its spec.
    Satisfied(StackResource),
    /// Not observable yet — the common case right after a whole stack is
    /// submitted, since tiers arrive in no particular order.
    Pending,
    /// The reference itself is malformed; retrying cannot help.
    Invalid(String),
}

/// Resolve a dependency reference against the store.
pub fn resolve(
    store: &ClusterStore,
    namespace: &str,
    target_kind: ResourceKind,
    target_name: &str,
) -> ClusterResult<Resolution> {
    if !is_valid_name(target_name) {
        return Ok(Resolution::Invalid(format!(
            "'{target_name}' is not a valid resource name"
        )));
    }
    match store.get_resource(target_kind, namespace, target_name)? {
        Some(resource) => Ok(Resolution::Satisfied(resource)),
        None => Ok(Resolution::Pending),
    }
}
