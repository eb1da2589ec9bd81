//! Declared resource types.
//!
//! A `StackResource` is one user-declared tier (or a chaos trigger) as
//! submitted through the portal and stored in the cluster store. Spec fields
//! that name a catalog entry (`engine`, `stack`, `framework`) stay strings at
//! this layer; reconcilers parse them into the closed catalog enums and turn
//! unknown values into permanent failures.

use serde::{Deserialize, Serialize};

use crate::status::StackStatus;

/// API group for all StackForge custom resources.
pub const API_GROUP: &str = "stack.example.com";

/// API version for all StackForge custom resources.
pub const API_VERSION: &str = "v1";

/// The four declared resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Database,
    Backend,
    Frontend,
    ChaosMonkey,
}

impl ResourceKind {
    /// Lowercase plural form, used in store keys and API routes.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Database => "databases",
            Self::Backend => "backends",
            Self::Frontend => "frontends",
            Self::ChaosMonkey => "chaosmonkeys",
        }
    }

    /// Parse the plural route segment back into a kind.
    pub fn from_plural(s: &str) -> Option<Self> {
        match s {
            "databases" => Some(Self::Database),
            "backends" => Some(Self::Backend),
            "frontends" => Some(Self::Frontend),
            "chaosmonkeys" => Some(Self::ChaosMonkey),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Database => "Database",
            Self::Backend => "Backend",
            Self::Frontend => "Frontend",
            Self::ChaosMonkey => "ChaosMonkey",
        };
        f.write_str(s)
    }
}

/// Identifying metadata for a declared resource.
///
/// The `uid` is assigned by the cluster store at creation time and is what
/// child owner references point at, so a delete-then-recreate under the same
/// name does not re-adopt stale children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

/// One declared tier (or chaos trigger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackResource {
    pub kind: ResourceKind,
    pub metadata: ObjectMeta,
    pub spec: StackSpec,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<StackStatus>,
}

impl StackResource {
    /// Composite store key: `{plural}/{namespace}/{name}`.
    pub fn table_key(&self) -> String {
        resource_key(self.kind, &self.metadata.namespace, &self.metadata.name)
    }
}

/// Build the composite store key for a resource identity.
pub fn resource_key(kind: ResourceKind, namespace: &str, name: &str) -> String {
    format!("{}/{namespace}/{name}", kind.plural())
}

/// Per-kind spec payload.
///
/// Untagged: each variant has a required field no other variant has
/// (`engine`, `stack`, `framework`, `target_app_label`), which is what
/// disambiguates the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StackSpec {
    Database(DatabaseSpec),
    Backend(BackendSpec),
    Frontend(FrontendSpec),
    ChaosMonkey(ChaosMonkeySpec),
}

impl StackSpec {
    /// The kind this spec payload belongs to.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Database(_) => ResourceKind::Database,
            Self::Backend(_) => ResourceKind::Backend,
            Self::Frontend(_) => ResourceKind::Frontend,
            Self::ChaosMonkey(_) => ResourceKind::ChaosMonkey,
        }
    }

    pub fn as_database(&self) -> Option<&DatabaseSpec> {
        match self {
            Self::Database(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> Option<&BackendSpec> {
        match self {
            Self::Backend(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_frontend(&self) -> Option<&FrontendSpec> {
        match self {
            Self::Frontend(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_chaos_monkey(&self) -> Option<&ChaosMonkeySpec> {
        match self {
            Self::ChaosMonkey(s) => Some(s),
            _ => None,
        }
    }
}

/// Declared database tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    /// Engine name: `mysql`, `postgres`, or `mongo`.
    pub engine: String,
    /// Storage request (e.g. `1Gi`). When set, a storage claim is
    /// synthesized and mounted at the engine's data path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub storage_size: Option<String>,
}

/// Declared backend tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Runtime stack: `node`, `python`, or `php`.
    pub stack: String,
    /// Name of the Database resource this backend connects to.
    #[serde(rename = "connectToDatabase")]
    pub connect_to_database: String,
}

/// Declared frontend tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendSpec {
    /// Framework name: `react`, `nextjs`, or `vue`.
    pub framework: String,
    /// Name of the Backend resource this frontend connects to.
    #[serde(rename = "connectToBackend")]
    pub connect_to_backend: String,
}

/// Declared chaos trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosMonkeySpec {
    /// `app` label value naming the victim population.
    pub target_app_label: String,
}

/// Check that a name is a valid DNS-1123 label: non-empty, at most 63
/// characters, lowercase alphanumeric and `-`, no leading/trailing `-`.
///
/// Used both by the portal on intake and by the dependency resolver, where a
/// malformed target name is a permanent (not retryable) condition.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    if name.starts_with('-') || name.ends_with('-') {
        return false;
    }
    name.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
