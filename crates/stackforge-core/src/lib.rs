//! stackforge-core — the StackForge resource model.
//!
//! Defines the declared-resource side of the system: resource kinds, object
//! metadata, per-tier specs as they arrive over the wire, the status/phase
//! vocabulary reconcilers report through, and the typed reconcile error that
//! separates permanent configuration failures from retryable not-ready
//! conditions.
//!
//! Everything here is plain data: no I/O, no clock, no cluster access.

pub mod error;
pub mod status;
pub mod types;

pub use error::{ReconcileError, ReconcileResult};
pub use status::{StackPhase, StackStatus};
pub use types::*;
