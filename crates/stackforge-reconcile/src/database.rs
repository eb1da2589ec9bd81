//! Database tier reconciler.
//!
//! No dependency to resolve, so a pass runs `New → Synthesizing →
//! Submitting → Ready` in one go. Failure modes: an unknown engine is
//! permanent; a submission conflict against a foreign owner is permanent;
//! any other store failure requeues from `Submitting`.

use tracing::debug;

use stackforge_cluster::ClusterStore;
use stackforge_core::{
    ReconcileError, ReconcileResult, ResourceKind, StackPhase, StackResource, StackStatus,
};
use stackforge_manifest::{adopt, database_children, DatabaseEngine};

use crate::config::ReconcilerConfig;
use crate::{classify_submission, Reconciler};

pub struct DatabaseReconciler {
    config: ReconcilerConfig,
}

impl DatabaseReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }
}

impl Reconciler for DatabaseReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    fn reconcile(
        &self,
        store: &ClusterStore,
        resource: &StackResource,
    ) -> ReconcileResult<StackStatus> {
        let spec = resource.spec.as_database().ok_or_else(|| {
            ReconcileError::permanent(format!("spec does not match kind {}", resource.kind))
        })?;
        let name = &resource.metadata.name;
        let namespace = &resource.metadata.namespace;

        debug!(%namespace, %name, phase = %StackPhase::Synthesizing, "database pass");
        let engine: DatabaseEngine = spec
            .engine
            .parse()
            .map_err(|e: stackforge_manifest::CatalogError| ReconcileError::permanent(e.to_string()))?;

        let (mut deploy, mut svc, claim) =
            database_children(name, engine, spec.storage_size.as_deref());
        adopt(&mut deploy.metadata, resource);
        adopt(&mut svc.metadata, resource);

        debug!(%namespace, %name, phase = %StackPhase::Submitting, "database pass");
        let delay = self.config.requeue_delay;
        if let Some(mut claim) = claim {
            adopt(&mut claim.metadata, resource);
            store
                .apply_claim(namespace, &claim)
                .map_err(|e| classify_submission(e, delay))?;
        }
        store
            .apply_workload(namespace, &deploy)
            .map_err(|e| classify_submission(e, delay))?;
        store
            .apply_service(namespace, &svc)
            .map_err(|e| classify_submission(e, delay))?;

        Ok(StackStatus::ready(format!(
            "database running ({} on {name}:{})",
            engine,
            engine.profile().port
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::{DatabaseSpec, StackSpec};

    fn reconciler() -> DatabaseReconciler {
        DatabaseReconciler::new(ReconcilerConfig::default())
    }

    fn database_resource(store: &ClusterStore, name: &str, engine: &str) -> StackResource {
        store
            .create_resource(
                "default",
                name,
                StackSpec::Database(DatabaseSpec {
                    engine: engine.into(),
                    storage_size: None,
                }),
            )
            .unwrap()
    }

    #[test]
    fn single_pass_reaches_ready() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = database_resource(&store, "shop-db", "postgres");

        let status = reconciler().reconcile(&store, &resource).unwrap();

        assert_eq!(status.phase, StackPhase::Ready);
        let deploy = store.get_workload("default", "shop-db").unwrap().unwrap();
        assert_eq!(deploy.spec.template.spec.containers[0].image, "postgres:13");
        assert!(store.get_service("default", "shop-db").unwrap().is_some());
    }

    #[test]
    fn children_carry_owner_reference() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = database_resource(&store, "shop-db", "mongo");

        reconciler().reconcile(&store, &resource).unwrap();

        let deploy = store.get_workload("default", "shop-db").unwrap().unwrap();
        assert_eq!(deploy.metadata.owner_references.len(), 1);
        assert_eq!(deploy.metadata.owner_references[0].uid, resource.metadata.uid);

        let svc = store.get_service("default", "shop-db").unwrap().unwrap();
        assert_eq!(svc.metadata.owner_references[0].uid, resource.metadata.uid);
    }

    #[test]
    fn unknown_engine_is_permanent() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = database_resource(&store, "shop-db", "oracle");

        let err = reconciler().reconcile(&store, &resource).unwrap_err();
        assert!(err.requeue_after().is_none());
        assert!(err.to_string().contains("oracle"));
        // Nothing submitted.
        assert!(store.get_workload("default", "shop-db").unwrap().is_none());
    }

    #[test]
    fn reconcile_twice_yields_one_of_each_child() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = database_resource(&store, "shop-db", "postgres");

        reconciler().reconcile(&store, &resource).unwrap();
        reconciler().reconcile(&store, &resource).unwrap();

        assert_eq!(
            store.list_pods_by_label("default", "app", "shop-db").unwrap().len(),
            1
        );
        assert!(store.get_workload("default", "shop-db").unwrap().is_some());
    }

    #[test]
    fn storage_request_submits_a_claim() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = store
            .create_resource(
                "default",
                "shop-db",
                StackSpec::Database(DatabaseSpec {
                    engine: "mysql".into(),
                    storage_size: Some("2Gi".into()),
                }),
            )
            .unwrap();

        reconciler().reconcile(&store, &resource).unwrap();

        let claim = store.get_claim("default", "shop-db-data").unwrap().unwrap();
        assert_eq!(claim.spec.resources.requests.storage, "2Gi");
        assert_eq!(claim.metadata.owner_references[0].uid, resource.metadata.uid);
    }

    #[test]
    fn foreign_owner_conflict_is_permanent() {
        let store = ClusterStore::open_in_memory().unwrap();

        // Someone else's child already holds the name.
        let other = database_resource(&store, "other-db", "postgres");
        let (mut squatter, _, _) = database_children("shop-db", DatabaseEngine::Postgres, None);
        adopt(&mut squatter.metadata, &other);
        store.apply_workload("default", &squatter).unwrap();

        let resource = database_resource(&store, "shop-db", "postgres");
        let err = reconciler().reconcile(&store, &resource).unwrap_err();
        assert!(err.requeue_after().is_none());
    }

    #[test]
    fn mismatched_spec_is_permanent() {
        let store = ClusterStore::open_in_memory().unwrap();
        let mut resource = database_resource(&store, "shop-db", "postgres");
        resource.spec = StackSpec::ChaosMonkey(stackforge_core::ChaosMonkeySpec {
            target_app_label: "shop-db".into(),
        });

        let err = reconciler().reconcile(&store, &resource).unwrap_err();
        assert!(err.requeue_after().is_none());
    }
}
