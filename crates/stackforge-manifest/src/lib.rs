//! stackforge-manifest — child resource synthesis.
//!
//! Pure data transformation from a declared tier spec to the concrete
//! workload manifests the cluster store applies: a process-group workload,
//! a service, and (for databases with a storage request) a storage claim.
//!
//! # Components
//!
//! - **`types`** — manifest shapes, serialized camelCase so the JSON is
//!   bit-for-bit what the cluster API expects
//! - **`catalog`** — closed engine/stack/framework tables; an unlisted name
//!   is a typed error, not a lookup panic
//! - **`synthesize`** — per-tier manifest construction, deterministic
//! - **`owner`** — owner-reference stamping for cascading deletion

pub mod catalog;
pub mod owner;
pub mod synthesize;
pub mod types;

pub use catalog::{
    BackendStack, CatalogError, DatabaseEngine, EngineProfile, FrontendFramework, BACKEND_PORT,
    FRONTEND_PORT,
};
pub use owner::{adopt, owner_reference};
pub use synthesize::{backend_children, database_children, frontend_children, tier_labels};
pub use types::*;
