//! Chaos reconciler — terminates one running pod matching a label.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use stackforge_cluster::ClusterStore;
use stackforge_core::{
    ReconcileError, ReconcileResult, ResourceKind, StackResource, StackStatus,
};
use stackforge_reconcile::{classify_submission, Reconciler, ReconcilerConfig};

/// Selects and terminates one victim per trigger.
///
/// Holds only an RNG; the victim population is re-listed from the store on
/// every trigger, so consecutive triggers see deletions and restarts made in
/// between.
pub struct ChaosReconciler {
    config: ReconcilerConfig,
    rng: Mutex<StdRng>,
}

impl ChaosReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic RNG, for tests.
    pub fn with_seed(config: ReconcilerConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Reconciler for ChaosReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ChaosMonkey
    }

    fn reconcile(
        &self,
        store: &ClusterStore,
        resource: &StackResource,
    ) -> ReconcileResult<StackStatus> {
        let spec = resource.spec.as_chaos_monkey().ok_or_else(|| {
            ReconcileError::permanent(format!("spec does not match kind {}", resource.kind))
        })?;
        let namespace = &resource.metadata.namespace;
        let delay = self.config.requeue_delay;

        let target = spec.target_app_label.trim();
        if target.is_empty() {
            return Err(ReconcileError::permanent(
                "target_app_label is required".to_string(),
            ));
        }

        let pods = store
            .list_pods_by_label(namespace, "app", target)
            .map_err(|e| classify_submission(e, delay))?;

        let victim = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            pods.choose(&mut *rng).cloned()
        };
        let Some(victim) = victim else {
            debug!(%namespace, %target, "no pods match the target label");
            return Ok(StackStatus::ready(format!(
                "no victims found with label app={target}"
            )));
        };

        info!(%namespace, %target, victim = %victim.name, "chaos monkey selected victim");
        store
            .delete_pod(namespace, &victim.name)
            .map_err(|e| classify_submission(e, delay))?;

        Ok(StackStatus::ready(format!(
            "terminated pod '{}'",
            victim.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use stackforge_cluster::PodInstance;
    use stackforge_core::{ChaosMonkeySpec, StackPhase, StackSpec};
    use stackforge_manifest::Labels;

    fn reconciler(seed: u64) -> ChaosReconciler {
        ChaosReconciler::with_seed(ReconcilerConfig::default(), seed)
    }

    fn trigger(store: &ClusterStore, target: &str) -> StackResource {
        store
            .create_resource(
                "default",
                "monkey",
                StackSpec::ChaosMonkey(ChaosMonkeySpec {
                    target_app_label: target.into(),
                }),
            )
            .unwrap()
    }

    fn labeled_pod(name: &str, app: &str) -> PodInstance {
        let mut labels = Labels::new();
        labels.insert("app".into(), app.into());
        PodInstance {
            name: name.into(),
            namespace: "default".into(),
            workload: app.into(),
            labels,
        }
    }

    #[test]
    fn empty_population_is_a_normal_outcome() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = trigger(&store, "shop-db");

        let status = reconciler(7).reconcile(&store, &resource).unwrap();
        assert_eq!(status.phase, StackPhase::Ready);
        assert!(status.message.contains("no victims found"));
    }

    #[test]
    fn missing_target_label_is_permanent() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = trigger(&store, "  ");

        let err = reconciler(7).reconcile(&store, &resource).unwrap_err();
        assert!(err.requeue_after().is_none());
    }

    #[test]
    fn single_pod_population_terminates_that_pod() {
        let store = ClusterStore::open_in_memory().unwrap();
        store.put_pod(&labeled_pod("shop-db-0", "shop-db")).unwrap();
        let resource = trigger(&store, "shop-db");

        let status = reconciler(7).reconcile(&store, &resource).unwrap();

        assert!(status.message.contains("shop-db-0"));
        assert!(store.get_pod("default", "shop-db-0").unwrap().is_none());
    }

    #[test]
    fn unlabeled_pods_are_never_victims() {
        let store = ClusterStore::open_in_memory().unwrap();
        store.put_pod(&labeled_pod("shop-db-0", "shop-db")).unwrap();
        store.put_pod(&labeled_pod("bystander-0", "bystander")).unwrap();
        let resource = trigger(&store, "shop-db");

        reconciler(7).reconcile(&store, &resource).unwrap();

        assert!(store.get_pod("default", "bystander-0").unwrap().is_some());
    }

    #[test]
    fn repeated_draws_cover_the_whole_population() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = trigger(&store, "shop-db");
        let chaos = reconciler(42);
        let names = ["shop-db-0", "shop-db-1", "shop-db-2"];

        let mut kills: HashMap<String, u32> = HashMap::new();
        for _ in 0..60 {
            // Restore the full population, then trigger once.
            for name in names {
                store.put_pod(&labeled_pod(name, "shop-db")).unwrap();
            }
            let status = chaos.reconcile(&store, &resource).unwrap();
            let victim = names
                .iter()
                .find(|n| status.message.contains(*n))
                .expect("status names the victim");
            *kills.entry(victim.to_string()).or_default() += 1;
        }

        // Uniform draw: over 60 triggers no pod is systematically excluded.
        for name in names {
            let count = kills.get(name).copied().unwrap_or(0);
            assert!(count > 0, "pod {name} was never selected");
        }
    }

    #[test]
    fn every_trigger_relists_the_population() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = trigger(&store, "shop-db");
        let chaos = reconciler(3);

        store.put_pod(&labeled_pod("shop-db-0", "shop-db")).unwrap();
        chaos.reconcile(&store, &resource).unwrap();

        // Population is empty now; the next trigger must see that.
        let status = chaos.reconcile(&store, &resource).unwrap();
        assert!(status.message.contains("no victims found"));
    }
}
