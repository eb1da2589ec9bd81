//! stackforge-chaos — the chaos reconciler.
//!
//! On every trigger: re-list the pods matching the declared `app` label,
//! pick one victim by uniform random draw, terminate it, and report its
//! identity in the status message. An empty population is a normal outcome
//! ("no victims found"), not an error; a missing target label is a
//! misconfiguration and fails permanently. No state is carried between
//! triggers.

pub mod reconciler;

pub use reconciler::ChaosReconciler;
