//! Backend tier reconciler.
//!
//! Depends on a Database by name. Every pass re-resolves the dependency:
//! pending suspends the pass in `DependencyWait` with the configured delay,
//! an invalid reference fails permanently, and a satisfied one lets the pass
//! proceed to synthesis with the database's name and port wired into the
//! container environment.

use tracing::debug;

use stackforge_cluster::ClusterStore;
use stackforge_core::{
    ReconcileError, ReconcileResult, ResourceKind, StackPhase, StackResource, StackStatus,
};
use stackforge_manifest::{adopt, backend_children, BackendStack, DatabaseEngine};

use crate::config::ReconcilerConfig;
use crate::resolver::{resolve, Resolution};
use crate::{classify_submission, Reconciler};

pub struct BackendReconciler {
    config: ReconcilerConfig,
}

impl BackendReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }
}

impl Reconciler for BackendReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Backend
    }

    fn reconcile(
        &self,
        store: &ClusterStore,
        resource: &StackResource,
    ) -> ReconcileResult<StackStatus> {
        let spec = resource.spec.as_backend().ok_or_else(|| {
            ReconcileError::permanent(format!("spec does not match kind {}", resource.kind))
        })?;
        let name = &resource.metadata.name;
        let namespace = &resource.metadata.namespace;
        let delay = self.config.requeue_delay;

        let stack: BackendStack = spec
            .stack
            .parse()
            .map_err(|e: stackforge_manifest::CatalogError| ReconcileError::permanent(e.to_string()))?;

        let db_name = &spec.connect_to_database;
        let resolution = resolve(store, namespace, ResourceKind::Database, db_name)
            .map_err(|e| classify_submission(e, delay))?;

        let database = match resolution {
            Resolution::Invalid(reason) => {
                return Err(ReconcileError::permanent(format!(
                    "invalid database reference: {reason}"
                )));
            }
            Resolution::Pending => {
                debug!(%namespace, %name, %db_name, phase = %StackPhase::DependencyWait, "backend pass");
                return Err(ReconcileError::wait_for_dependency(
                    format!("Database '{db_name}' not found yet"),
                    delay,
                ));
            }
            Resolution::Satisfied(database) => database,
        };

        // The dependency exists; read its engine for the connection port. A
        // database whose own spec is unusable is treated as not ready rather
        // than failing its dependent.
        let db_port = database
            .spec
            .as_database()
            .and_then(|s| s.engine.parse::<DatabaseEngine>().ok())
            .map(|engine| engine.profile().port)
            .ok_or_else(|| {
                ReconcileError::wait_for_dependency(
                    format!("Database '{db_name}' has no usable engine yet"),
                    delay,
                )
            })?;

        debug!(%namespace, %name, phase = %StackPhase::Synthesizing, "backend pass");
        let (mut deploy, mut svc) = backend_children(name, stack, db_name, db_port);
        adopt(&mut deploy.metadata, resource);
        adopt(&mut svc.metadata, resource);

        debug!(%namespace, %name, phase = %StackPhase::Submitting, "backend pass");
        store
            .apply_workload(namespace, &deploy)
            .map_err(|e| classify_submission(e, delay))?;
        store
            .apply_service(namespace, &svc)
            .map_err(|e| classify_submission(e, delay))?;

        Ok(StackStatus::ready(format!(
            "backend running, connected to database '{db_name}'"
        )))
    }
}
