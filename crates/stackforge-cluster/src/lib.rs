//! stackforge-cluster — the cluster resource store.
//!
//! Backed by [redb](https://docs.rs/redb), this is the durable store the
//! reconcilers read declared resources from and submit child manifests to.
//! It also simulates the two platform behaviors the reconcilers rely on but
//! do not implement themselves:
//!
//! - **Pod materialization** — applying a workload manifest brings up one
//!   running pod instance carrying the workload's labels (what the chaos
//!   controller lists and terminates).
//! - **Owner-cascade deletion** — deleting a declared resource deletes every
//!   child manifest whose owner reference carries its uid, and the pods of
//!   every deleted workload.
//!
//! The `ClusterStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and is passed into every reconcile call, so tests swap
//! in `open_in_memory()` instead of a mock.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{ClusterError, ClusterResult};
pub use store::ClusterStore;
pub use types::PodInstance;
