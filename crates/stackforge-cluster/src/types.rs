//! Runtime types owned by the cluster store.

use serde::{Deserialize, Serialize};
use stackforge_manifest::Labels;

/// One running process instance, materialized from an applied workload.
///
/// Pods carry their workload's labels; the chaos controller selects victims
/// by the `app` label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodInstance {
    pub name: String,
    pub namespace: String,
    /// Name of the workload manifest this pod belongs to.
    pub workload: String,
    pub labels: Labels,
}

impl PodInstance {
    /// Build the composite key for the pods table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
