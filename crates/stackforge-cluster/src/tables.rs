//! redb table definitions for the cluster store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized types).
//! Declared resources are keyed `{plural}/{namespace}/{name}`; everything
//! else is keyed `{namespace}/{name}`.

use redb::TableDefinition;

/// Declared stack resources keyed by `{plural}/{namespace}/{name}`.
pub const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// Workload manifests keyed by `{namespace}/{name}`.
pub const WORKLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("workloads");

/// Service manifests keyed by `{namespace}/{name}`.
pub const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");

/// Storage claim manifests keyed by `{namespace}/{name}`.
pub const CLAIMS: TableDefinition<&str, &[u8]> = TableDefinition::new("claims");

/// Running pod instances keyed by `{namespace}/{name}`.
pub const PODS: TableDefinition<&str, &[u8]> = TableDefinition::new("pods");
