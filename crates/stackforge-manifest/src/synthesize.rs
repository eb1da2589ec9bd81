//! Per-tier manifest synthesis.
//!
//! Deterministic: the same declared spec always produces byte-identical
//! manifests. Child names derive from the parent name, which is what makes
//! re-submission after a partial pass an upsert rather than a duplicate.

use crate::catalog::{BackendStack, DatabaseEngine, FrontendFramework, BACKEND_PORT, FRONTEND_PORT};
use crate::types::*;

/// Keep-alive override for tiers whose catalog image has no long-running
/// workload of its own. Database images keep their real entrypoint.
const KEEP_ALIVE_COMMAND: [&str; 3] = ["/bin/sh", "-c", "echo 'App Running'; sleep 3600"];

/// Standard labels for one tier: `{app: <name>, type: <tier>}`.
pub fn tier_labels(name: &str, tier: &str) -> Labels {
    let mut labels = Labels::new();
    labels.insert("app".to_string(), name.to_string());
    labels.insert("type".to_string(), tier.to_string());
    labels
}

fn workload(
    name: &str,
    image: &str,
    port: u16,
    env: Vec<EnvVar>,
    labels: Labels,
    command: Option<Vec<String>>,
) -> WorkloadManifest {
    WorkloadManifest {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata: ManifestMeta::new(name, labels.clone()),
        spec: WorkloadSpec {
            replicas: 1,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            template: PodTemplate {
                metadata: TemplateMeta { labels },
                spec: PodSpec {
                    containers: vec![Container {
                        name: "app".to_string(),
                        image: image.to_string(),
                        ports: vec![ContainerPort {
                            container_port: port,
                        }],
                        env,
                        command,
                        volume_mounts: None,
                    }],
                    volumes: None,
                },
            },
        },
    }
}

fn service(name: &str, port: u16, labels: Labels) -> ServiceManifest {
    ServiceManifest {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata: ManifestMeta::new(name, labels.clone()),
        spec: ServiceSpec {
            selector: labels,
            ports: vec![ServicePort {
                port,
                target_port: port,
            }],
        },
    }
}

fn keep_alive() -> Option<Vec<String>> {
    Some(KEEP_ALIVE_COMMAND.iter().map(|s| s.to_string()).collect())
}

/// Children for a Database tier.
///
/// With a storage request, a claim named `{name}-data` is synthesized and
/// mounted at the engine's data path.
pub fn database_children(
    name: &str,
    engine: DatabaseEngine,
    storage_size: Option<&str>,
) -> (
    WorkloadManifest,
    ServiceManifest,
    Option<StorageClaimManifest>,
) {
    let profile = engine.profile();
    let labels = tier_labels(name, "database");
    let env = profile
        .env
        .iter()
        .map(|(k, v)| EnvVar::new(*k, *v))
        .collect();

    let mut deploy = workload(name, profile.image, profile.port, env, labels.clone(), None);

    let claim = storage_size.map(|size| {
        let claim_name = format!("{name}-data");
        // Wire the claim into the workload's single container.
        deploy.spec.template.spec.volumes = Some(vec![Volume {
            name: "data".to_string(),
            persistent_volume_claim: ClaimRef {
                claim_name: claim_name.clone(),
            },
        }]);
        deploy.spec.template.spec.containers[0].volume_mounts = Some(vec![VolumeMount {
            name: "data".to_string(),
            mount_path: profile.data_path.to_string(),
        }]);

        StorageClaimManifest {
            api_version: "v1".to_string(),
            kind: "PersistentVolumeClaim".to_string(),
            metadata: ManifestMeta::new(claim_name, labels.clone()),
            spec: ClaimSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                resources: ClaimResources {
                    requests: StorageRequest {
                        storage: size.to_string(),
                    },
                },
            },
        }
    });

    let svc = service(name, profile.port, labels);
    (deploy, svc, claim)
}

/// Children for a Backend tier, wired to its database by host and port.
pub fn backend_children(
    name: &str,
    stack: BackendStack,
    db_host: &str,
    db_port: u16,
) -> (WorkloadManifest, ServiceManifest) {
    let labels = tier_labels(name, "backend");
    let env = vec![
        EnvVar::new("DB_HOST", db_host),
        EnvVar::new("DB_PORT", db_port.to_string()),
    ];
    let deploy = workload(
        name,
        stack.image(),
        BACKEND_PORT,
        env,
        labels.clone(),
        keep_alive(),
    );
    let svc = service(name, BACKEND_PORT, labels);
    (deploy, svc)
}

/// Children for a Frontend tier, wired to its backend by URL.
pub fn frontend_children(
    name: &str,
    framework: FrontendFramework,
    backend_name: &str,
) -> (WorkloadManifest, ServiceManifest) {
    let labels = tier_labels(name, "frontend");
    let env = vec![EnvVar::new(
        "API_URL",
        format!("http://{backend_name}:{BACKEND_PORT}"),
    )];
    let deploy = workload(
        name,
        framework.image(),
        FRONTEND_PORT,
        env,
        labels.clone(),
        keep_alive(),
    );
    let svc = service(name, FRONTEND_PORT, labels);
    (deploy, svc)
}
