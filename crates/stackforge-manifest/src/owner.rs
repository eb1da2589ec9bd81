//! Owner-reference binding.
//!
//! Every child manifest must carry exactly one owner reference to the
//! declared resource that produced it before submission; a child submitted
//! without one is invisible to the garbage collector and would survive its
//! parent.

use stackforge_core::{StackResource, API_GROUP, API_VERSION};

use crate::types::{ManifestMeta, OwnerReference};

/// Build the owner reference pointing at a declared parent resource.
pub fn owner_reference(parent: &StackResource) -> OwnerReference {
    OwnerReference {
        api_version: format!("{API_GROUP}/{API_VERSION}"),
        kind: parent.kind.to_string(),
        name: parent.metadata.name.clone(),
        uid: parent.metadata.uid.clone(),
        controller: true,
        block_owner_deletion: true,
    }
}

/// Stamp `parent` as the single owner of a child manifest.
pub fn adopt(meta: &mut ManifestMeta, parent: &StackResource) {
    meta.set_owner(owner_reference(parent));
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::{DatabaseSpec, ObjectMeta, ResourceKind, StackSpec};

    fn parent() -> StackResource {
        StackResource {
            kind: ResourceKind::Database,
            metadata: ObjectMeta {
                namespace: "default".into(),
                name: "shop-db".into(),
                uid: "uid-123".into(),
            },
            spec: StackSpec::Database(DatabaseSpec {
                engine: "postgres".into(),
                storage_size: None,
            }),
            status: None,
        }
    }

    #[test]
    fn adopt_stamps_exactly_one_reference() {
        let (mut deploy, mut svc, _) = crate::synthesize::database_children(
            "shop-db",
            crate::catalog::DatabaseEngine::Postgres,
            None,
        );
        let parent = parent();

        adopt(&mut deploy.metadata, &parent);
        adopt(&mut svc.metadata, &parent);

        for meta in [&deploy.metadata, &svc.metadata] {
            assert_eq!(meta.owner_references.len(), 1);
            let owner = &meta.owner_references[0];
            assert_eq!(owner.api_version, "stack.example.com/v1");
            assert_eq!(owner.kind, "Database");
            assert_eq!(owner.name, "shop-db");
            assert_eq!(owner.uid, "uid-123");
            assert!(owner.controller);
            assert!(owner.block_owner_deletion);
        }
    }

    #[test]
    fn re_adoption_is_idempotent() {
        let (mut deploy, _, _) = crate::synthesize::database_children(
            "shop-db",
            crate::catalog::DatabaseEngine::Postgres,
            None,
        );
        let parent = parent();

        adopt(&mut deploy.metadata, &parent);
        adopt(&mut deploy.metadata, &parent);

        assert_eq!(deploy.metadata.owner_references.len(), 1);
    }
}
