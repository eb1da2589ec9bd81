//! Frontend tier reconciler.
//!
//! Depends on a Backend by name, gated exactly like Backend-on-Database:
//! every dependent tier checks its dependency before submitting, so a
//! frontend never ships an `API_URL` pointing at nothing.

use tracing::debug;

use stackforge_cluster::ClusterStore;
use stackforge_core::{
    ReconcileError, ReconcileResult, ResourceKind, StackPhase, StackResource, StackStatus,
};
use stackforge_manifest::{adopt, frontend_children, FrontendFramework};

use crate::config::ReconcilerConfig;
use crate::resolver::{resolve, Resolution};
use crate::{classify_submission, Reconciler};

pub struct FrontendReconciler {
    config: ReconcilerConfig,
}

impl FrontendReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }
}

impl Reconciler for FrontendReconciler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Frontend
    }

    fn reconcile(
        &self,
        store: &ClusterStore,
        resource: &StackResource,
    ) -> ReconcileResult<StackStatus> {
        let spec = resource.spec.as_frontend().ok_or_else(|| {
            ReconcileError::permanent(format!("spec does not match kind {}", resource.kind))
        })?;
        let name = &resource.metadata.name;
        let namespace = &resource.metadata.namespace;
        let delay = self.config.requeue_delay;

        let framework: FrontendFramework = spec
            .framework
            .parse()
            .map_err(|e: stackforge_manifest::CatalogError| ReconcileError::permanent(e.to_string()))?;

        let backend_name = &spec.connect_to_backend;
        match resolve(store, namespace, ResourceKind::Backend, backend_name)
            .map_err(|e| classify_submission(e, delay))?
        {
            Resolution::Invalid(reason) => {
                return Err(ReconcileError::permanent(format!(
                    "invalid backend reference: {reason}"
                )));
            }
            Resolution::Pending => {
                debug!(%namespace, %name, %backend_name, phase = %StackPhase::DependencyWait, "frontend pass");
                return Err(ReconcileError::wait_for_dependency(
                    format!("Backend '{backend_name}' not found yet"),
                    delay,
                ));
            }
            Resolution::Satisfied(_) => {}
        }

        debug!(%namespace, %name, phase = %StackPhase::Synthesizing, "frontend pass");
        let (mut deploy, mut svc) = frontend_children(name, framework, backend_name);
        adopt(&mut deploy.metadata, resource);
        adopt(&mut svc.metadata, resource);

        debug!(%namespace, %name, phase = %StackPhase::Submitting, "frontend pass");
        store
            .apply_workload(namespace, &deploy)
            .map_err(|e| classify_submission(e, delay))?;
        store
            .apply_service(namespace, &svc)
            .map_err(|e| classify_submission(e, delay))?;

        Ok(StackStatus::ready(format!(
            "frontend running, connected to backend '{backend_name}'"
        )))
    }
}
