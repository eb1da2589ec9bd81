//! ClusterStore — redb-backed resource storage.
//!
//! Typed CRUD over declared stack resources, child manifests, and pod
//! instances. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).
//!
//! Manifest submission is upsert-by-name with an owner guard: re-applying a
//! child under the same owner uid replaces it silently (what makes
//! reconciliation idempotent), while touching a child owned by a different
//! uid is a `Conflict`.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;
use uuid::Uuid;

use stackforge_core::{resource_key, ResourceKind, StackResource, StackSpec, StackStatus};
use stackforge_manifest::{ServiceManifest, StorageClaimManifest, WorkloadManifest};

use crate::error::{ClusterError, ClusterResult};
use crate::tables::*;
use crate::types::PodInstance;

/// Shape of every table in this store: `&str` keys, JSON `&[u8]` values.
type TableDef = TableDefinition<'static, &'static str, &'static [u8]>;

/// Convert any `Display` error into a `ClusterError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| ClusterError::$variant(e.to_string())
    };
}

/// Thread-safe cluster store backed by redb.
#[derive(Clone)]
pub struct ClusterStore {
    db: Arc<Database>,
}

impl ClusterStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> ClusterResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "cluster store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> ClusterResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory cluster store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> ClusterResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(CLAIMS).map_err(map_err!(Table))?;
        txn.open_table(PODS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Declared resources ─────────────────────────────────────────

    /// Create a declared resource, assigning its uid.
    ///
    /// Fails with `Conflict` if a resource of the same kind/namespace/name
    /// already exists; declared resources are created once and mutated only
    /// through `put_status`.
    pub fn create_resource(
        &self,
        namespace: &str,
        name: &str,
        spec: StackSpec,
    ) -> ClusterResult<StackResource> {
        let kind = spec.kind();
        let resource = StackResource {
            kind,
            metadata: stackforge_core::ObjectMeta {
                namespace: namespace.to_string(),
                name: name.to_string(),
                uid: Uuid::new_v4().to_string(),
            },
            spec,
            status: None,
        };
        let key = resource.table_key();
        let value = serde_json::to_vec(&resource).map_err(map_err!(Serialize))?;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            if table.get(key.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(ClusterError::Conflict(format!(
                    "{kind} '{namespace}/{name}' already exists"
                )));
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, uid = %resource.metadata.uid, "resource created");
        Ok(resource)
    }

    /// Get a declared resource by identity.
    pub fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<StackResource>> {
        let key = resource_key(kind, namespace, name);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let resource: StackResource =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(resource))
            }
            None => Ok(None),
        }
    }

    /// List all declared resources, every kind.
    pub fn list_resources(&self) -> ClusterResult<Vec<StackResource>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let resource: StackResource =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(resource);
        }
        Ok(results)
    }

    /// Persist a reconcile status on a resource. Returns false if the
    /// resource no longer exists (deleted mid-flight), which callers treat
    /// as "stop here".
    pub fn put_status(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        status: &StackStatus,
    ) -> ClusterResult<bool> {
        let key = resource_key(kind, namespace, name);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let existing = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    let resource: StackResource =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    Some(resource)
                }
                None => None,
            };
            match existing {
                Some(mut resource) => {
                    resource.status = Some(status.clone());
                    let value = serde_json::to_vec(&resource).map_err(map_err!(Serialize))?;
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                    updated = true;
                }
                None => updated = false,
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(updated)
    }

    /// Delete a declared resource and cascade over its owned children:
    /// every manifest whose single owner reference carries the resource's
    /// uid is removed, and the pods of every removed workload with it.
    ///
    /// Returns true if the resource existed. This is the store-side stand-in
    /// for the platform garbage collector following owner references.
    pub fn delete_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<bool> {
        let Some(resource) = self.get_resource(kind, namespace, name)? else {
            return Ok(false);
        };
        let uid = resource.metadata.uid;
        let key = resource_key(kind, namespace, name);

        // Collect owned children in read transactions first.
        let owned_workloads = self.owned_keys(WORKLOADS, namespace, &uid, |m: &WorkloadManifest| {
            owner_uid(&m.metadata)
        })?;
        let owned_services = self.owned_keys(SERVICES, namespace, &uid, |m: &ServiceManifest| {
            owner_uid(&m.metadata)
        })?;
        let owned_claims = self.owned_keys(CLAIMS, namespace, &uid, |m: &StorageClaimManifest| {
            owner_uid(&m.metadata)
        })?;
        let doomed_pods = {
            let workload_names: Vec<String> = owned_workloads
                .iter()
                .filter_map(|k| k.split('/').nth(1).map(str::to_string))
                .collect();
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(PODS).map_err(map_err!(Table))?;
            let prefix = format!("{namespace}/");
            let mut keys = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (k, value) = entry.map_err(map_err!(Read))?;
                if !k.value().starts_with(&prefix) {
                    continue;
                }
                let pod: PodInstance =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if workload_names.contains(&pod.workload) {
                    keys.push(k.value().to_string());
                }
            }
            keys
        };

        // Delete everything in one write transaction.
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            table.remove(key.as_str()).map_err(map_err!(Write))?;
        }
        remove_keys(&txn, WORKLOADS, &owned_workloads)?;
        remove_keys(&txn, SERVICES, &owned_services)?;
        remove_keys(&txn, CLAIMS, &owned_claims)?;
        remove_keys(&txn, PODS, &doomed_pods)?;
        txn.commit().map_err(map_err!(Transaction))?;

        debug!(
            %key,
            workloads = owned_workloads.len(),
            services = owned_services.len(),
            claims = owned_claims.len(),
            pods = doomed_pods.len(),
            "resource deleted, children cascaded"
        );
        Ok(true)
    }

    /// Collect `{namespace}/…` keys in a manifest table whose owner uid
    /// matches.
    fn owned_keys<T: serde::de::DeserializeOwned>(
        &self,
        table_def: TableDef,
        namespace: &str,
        uid: &str,
        owner_of: impl Fn(&T) -> Option<String>,
    ) -> ClusterResult<Vec<String>> {
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if !key.value().starts_with(&prefix) {
                continue;
            }
            let manifest: T =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if owner_of(&manifest).as_deref() == Some(uid) {
                keys.push(key.value().to_string());
            }
        }
        Ok(keys)
    }

    // ── Child manifests ────────────────────────────────────────────

    /// Apply a workload manifest (create-or-replace by name) and
    /// materialize its pod instance if not already running.
    pub fn apply_workload(
        &self,
        namespace: &str,
        manifest: &WorkloadManifest,
    ) -> ClusterResult<()> {
        let key = format!("{namespace}/{}", manifest.metadata.name);
        let value = serde_json::to_vec(manifest).map_err(map_err!(Serialize))?;
        let new_owner = owner_uid(&manifest.metadata);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            check_owner_guard::<WorkloadManifest>(&table, &key, new_owner.as_deref())?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;

            // Materialize one running pod, kept across re-applies.
            let pod = PodInstance {
                name: format!("{}-0", manifest.metadata.name),
                namespace: namespace.to_string(),
                workload: manifest.metadata.name.clone(),
                labels: manifest.spec.template.metadata.labels.clone(),
            };
            let pod_key = pod.table_key();
            let mut pods = txn.open_table(PODS).map_err(map_err!(Table))?;
            if pods.get(pod_key.as_str()).map_err(map_err!(Read))?.is_none() {
                let pod_value = serde_json::to_vec(&pod).map_err(map_err!(Serialize))?;
                pods.insert(pod_key.as_str(), pod_value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "workload applied");
        Ok(())
    }

    /// Get a workload manifest by namespace/name.
    pub fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<WorkloadManifest>> {
        self.get_manifest(WORKLOADS, namespace, name)
    }

    /// Apply a service manifest (create-or-replace by name).
    pub fn apply_service(&self, namespace: &str, manifest: &ServiceManifest) -> ClusterResult<()> {
        let key = format!("{namespace}/{}", manifest.metadata.name);
        let value = serde_json::to_vec(manifest).map_err(map_err!(Serialize))?;
        let new_owner = owner_uid(&manifest.metadata);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            check_owner_guard::<ServiceManifest>(&table, &key, new_owner.as_deref())?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "service applied");
        Ok(())
    }

    /// Get a service manifest by namespace/name.
    pub fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<ServiceManifest>> {
        self.get_manifest(SERVICES, namespace, name)
    }

    /// Apply a storage claim manifest (create-or-replace by name).
    pub fn apply_claim(
        &self,
        namespace: &str,
        manifest: &StorageClaimManifest,
    ) -> ClusterResult<()> {
        let key = format!("{namespace}/{}", manifest.metadata.name);
        let value = serde_json::to_vec(manifest).map_err(map_err!(Serialize))?;
        let new_owner = owner_uid(&manifest.metadata);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CLAIMS).map_err(map_err!(Table))?;
            check_owner_guard::<StorageClaimManifest>(&table, &key, new_owner.as_deref())?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "storage claim applied");
        Ok(())
    }

    /// Get a storage claim manifest by namespace/name.
    pub fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<StorageClaimManifest>> {
        self.get_manifest(CLAIMS, namespace, name)
    }

    fn get_manifest<T: serde::de::DeserializeOwned>(
        &self,
        table_def: TableDef,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<T>> {
        let key = format!("{namespace}/{name}");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let manifest: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(manifest))
            }
            None => Ok(None),
        }
    }

    // ── Pods ───────────────────────────────────────────────────────

    /// Insert or update a pod instance directly.
    ///
    /// `apply_workload` materializes one pod per workload; this is for the
    /// rest of the platform (replica scale-out) and for tests that need a
    /// larger victim population.
    pub fn put_pod(&self, pod: &PodInstance) -> ClusterResult<()> {
        let key = pod.table_key();
        let value = serde_json::to_vec(pod).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PODS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a pod by namespace/name.
    pub fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Option<PodInstance>> {
        self.get_manifest(PODS, namespace, name)
    }

    /// List pods in a namespace carrying `labels[key] == value`, in name
    /// order (redb iterates keys sorted, and keys embed the name).
    pub fn list_pods_by_label(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> ClusterResult<Vec<PodInstance>> {
        let prefix = format!("{namespace}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PODS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (k, v) = entry.map_err(map_err!(Read))?;
            if !k.value().starts_with(&prefix) {
                continue;
            }
            let pod: PodInstance =
                serde_json::from_slice(v.value()).map_err(map_err!(Deserialize))?;
            if pod.labels.get(key).map(String::as_str) == Some(value) {
                results.push(pod);
            }
        }
        Ok(results)
    }

    /// Delete a pod by namespace/name. Returns true if it existed.
    pub fn delete_pod(&self, namespace: &str, name: &str) -> ClusterResult<bool> {
        let key = format!("{namespace}/{name}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(PODS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "pod deleted");
        Ok(existed)
    }
}

/// Owner uid of a manifest, if it has been adopted.
fn owner_uid(meta: &stackforge_manifest::ManifestMeta) -> Option<String> {
    meta.owner_references.first().map(|o| o.uid.clone())
}

/// Reject a replace where the existing record is owned by a different uid.
fn check_owner_guard<T>(
    table: &redb::Table<'_, &'static str, &'static [u8]>,
    key: &str,
    new_owner: Option<&str>,
) -> ClusterResult<()>
where
    T: serde::de::DeserializeOwned + HasMeta,
{
    let existing_owner = match table.get(key).map_err(map_err!(Read))? {
        Some(guard) => {
            let manifest: T =
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
            owner_uid(manifest.meta())
        }
        None => return Ok(()),
    };
    if existing_owner.as_deref() != new_owner {
        return Err(ClusterError::Conflict(format!(
            "'{key}' is owned by a different resource"
        )));
    }
    Ok(())
}

/// Access to manifest metadata, for the owner guard.
trait HasMeta {
    fn meta(&self) -> &stackforge_manifest::ManifestMeta;
}

impl HasMeta for WorkloadManifest {
    fn meta(&self) -> &stackforge_manifest::ManifestMeta {
        &self.metadata
    }
}

impl HasMeta for ServiceManifest {
    fn meta(&self) -> &stackforge_manifest::ManifestMeta {
        &self.metadata
    }
}

impl HasMeta for StorageClaimManifest {
    fn meta(&self) -> &stackforge_manifest::ManifestMeta {
        &self.metadata
    }
}

/// Remove a batch of keys from a table inside an open write transaction.
fn remove_keys(
    txn: &redb::WriteTransaction,
    table_def: TableDef,
    keys: &[String],
) -> ClusterResult<()> {
    let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
    for key in keys {
        table.remove(key.as_str()).map_err(map_err!(Write))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::{DatabaseSpec, StackPhase};
    use stackforge_manifest::{adopt, database_children, DatabaseEngine};

    fn db_spec(engine: &str) -> StackSpec {
        StackSpec::Database(DatabaseSpec {
            engine: engine.to_string(),
            storage_size: None,
        })
    }

    /// Create a database resource and apply its adopted children.
    fn provision_database(store: &ClusterStore, name: &str) -> StackResource {
        let resource = store.create_resource("default", name, db_spec("postgres")).unwrap();
        let (mut deploy, mut svc, _) = database_children(name, DatabaseEngine::Postgres, None);
        adopt(&mut deploy.metadata, &resource);
        adopt(&mut svc.metadata, &resource);
        store.apply_workload("default", &deploy).unwrap();
        store.apply_service("default", &svc).unwrap();
        resource
    }

    // ── Resource CRUD ──────────────────────────────────────────────

    #[test]
    fn resource_create_and_get() {
        let store = ClusterStore::open_in_memory().unwrap();
        let created = store
            .create_resource("default", "shop-db", db_spec("postgres"))
            .unwrap();
        assert!(!created.metadata.uid.is_empty());

        let fetched = store
            .get_resource(ResourceKind::Database, "default", "shop-db")
            .unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[test]
    fn resource_create_duplicate_is_conflict() {
        let store = ClusterStore::open_in_memory().unwrap();
        store
            .create_resource("default", "shop-db", db_spec("postgres"))
            .unwrap();

        let result = store.create_resource("default", "shop-db", db_spec("mysql"));
        assert!(matches!(result, Err(ClusterError::Conflict(_))));
    }

    #[test]
    fn resources_get_distinct_uids() {
        let store = ClusterStore::open_in_memory().unwrap();
        let a = store.create_resource("default", "a", db_spec("postgres")).unwrap();
        let b = store.create_resource("default", "b", db_spec("postgres")).unwrap();
        assert_ne!(a.metadata.uid, b.metadata.uid);
    }

    #[test]
    fn resource_kinds_do_not_collide_on_name() {
        let store = ClusterStore::open_in_memory().unwrap();
        store.create_resource("default", "shop", db_spec("postgres")).unwrap();
        store
            .create_resource(
                "default",
                "shop",
                StackSpec::ChaosMonkey(stackforge_core::ChaosMonkeySpec {
                    target_app_label: "shop".into(),
                }),
            )
            .unwrap();

        assert!(store
            .get_resource(ResourceKind::Database, "default", "shop")
            .unwrap()
            .is_some());
        assert!(store
            .get_resource(ResourceKind::ChaosMonkey, "default", "shop")
            .unwrap()
            .is_some());
    }

    #[test]
    fn status_update_roundtrip() {
        let store = ClusterStore::open_in_memory().unwrap();
        store.create_resource("default", "shop-db", db_spec("postgres")).unwrap();

        let status = StackStatus::ready("database provisioned");
        assert!(store
            .put_status(ResourceKind::Database, "default", "shop-db", &status)
            .unwrap());

        let fetched = store
            .get_resource(ResourceKind::Database, "default", "shop-db")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status.unwrap().phase, StackPhase::Ready);
    }

    #[test]
    fn status_update_on_deleted_resource_reports_missing() {
        let store = ClusterStore::open_in_memory().unwrap();
        let updated = store
            .put_status(
                ResourceKind::Database,
                "default",
                "gone",
                &StackStatus::ready("x"),
            )
            .unwrap();
        assert!(!updated);
    }

    // ── Manifest submission ────────────────────────────────────────

    #[test]
    fn apply_workload_materializes_one_pod() {
        let store = ClusterStore::open_in_memory().unwrap();
        provision_database(&store, "shop-db");

        let pods = store.list_pods_by_label("default", "app", "shop-db").unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "shop-db-0");
        assert_eq!(pods[0].workload, "shop-db");
    }

    #[test]
    fn reapply_same_owner_is_idempotent() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = provision_database(&store, "shop-db");

        // Second pass over the same spec: same names, same owner.
        let (mut deploy, mut svc, _) = database_children("shop-db", DatabaseEngine::Postgres, None);
        adopt(&mut deploy.metadata, &resource);
        adopt(&mut svc.metadata, &resource);
        store.apply_workload("default", &deploy).unwrap();
        store.apply_service("default", &svc).unwrap();

        assert_eq!(
            store.list_pods_by_label("default", "app", "shop-db").unwrap().len(),
            1
        );
        assert!(store.get_workload("default", "shop-db").unwrap().is_some());
    }

    #[test]
    fn apply_under_foreign_owner_is_conflict() {
        let store = ClusterStore::open_in_memory().unwrap();
        provision_database(&store, "shop-db");

        // A different resource (different uid) tries to claim the same child name.
        let intruder = store
            .create_resource("default", "other-db", db_spec("mysql"))
            .unwrap();
        let (mut deploy, _, _) = database_children("shop-db", DatabaseEngine::Mysql, None);
        adopt(&mut deploy.metadata, &intruder);

        let result = store.apply_workload("default", &deploy);
        assert!(matches!(result, Err(ClusterError::Conflict(_))));
        assert!(!result.unwrap_err().is_retryable());
    }

    // ── Cascade deletion ───────────────────────────────────────────

    #[test]
    fn delete_resource_cascades_owned_children_and_pods() {
        let store = ClusterStore::open_in_memory().unwrap();
        let resource = store
            .create_resource(
                "default",
                "shop-db",
                StackSpec::Database(DatabaseSpec {
                    engine: "postgres".into(),
                    storage_size: Some("1Gi".into()),
                }),
            )
            .unwrap();
        let (mut deploy, mut svc, claim) =
            database_children("shop-db", DatabaseEngine::Postgres, Some("1Gi"));
        let mut claim = claim.unwrap();
        adopt(&mut deploy.metadata, &resource);
        adopt(&mut svc.metadata, &resource);
        adopt(&mut claim.metadata, &resource);
        store.apply_workload("default", &deploy).unwrap();
        store.apply_service("default", &svc).unwrap();
        store.apply_claim("default", &claim).unwrap();

        assert!(store
            .delete_resource(ResourceKind::Database, "default", "shop-db")
            .unwrap());

        assert!(store.get_workload("default", "shop-db").unwrap().is_none());
        assert!(store.get_service("default", "shop-db").unwrap().is_none());
        assert!(store.get_claim("default", "shop-db-data").unwrap().is_none());
        assert!(store
            .list_pods_by_label("default", "app", "shop-db")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_resource_leaves_unrelated_children() {
        let store = ClusterStore::open_in_memory().unwrap();
        provision_database(&store, "shop-db");
        provision_database(&store, "other-db");

        store
            .delete_resource(ResourceKind::Database, "default", "shop-db")
            .unwrap();

        assert!(store.get_workload("default", "other-db").unwrap().is_some());
        assert_eq!(
            store.list_pods_by_label("default", "app", "other-db").unwrap().len(),
            1
        );
    }

    #[test]
    fn delete_missing_resource_reports_false() {
        let store = ClusterStore::open_in_memory().unwrap();
        assert!(!store
            .delete_resource(ResourceKind::Database, "default", "nope")
            .unwrap());
    }

    // ── Pods ───────────────────────────────────────────────────────

    #[test]
    fn pods_filter_by_label() {
        let store = ClusterStore::open_in_memory().unwrap();
        for i in 0..3 {
            let mut labels = stackforge_manifest::Labels::new();
            labels.insert("app".into(), "shop-db".into());
            store
                .put_pod(&PodInstance {
                    name: format!("shop-db-{i}"),
                    namespace: "default".into(),
                    workload: "shop-db".into(),
                    labels,
                })
                .unwrap();
        }
        let mut other = stackforge_manifest::Labels::new();
        other.insert("app".into(), "something-else".into());
        store
            .put_pod(&PodInstance {
                name: "stray-0".into(),
                namespace: "default".into(),
                workload: "stray".into(),
                labels: other,
            })
            .unwrap();

        let pods = store.list_pods_by_label("default", "app", "shop-db").unwrap();
        assert_eq!(pods.len(), 3);
        // Name order, from redb key ordering.
        assert_eq!(pods[0].name, "shop-db-0");
        assert_eq!(pods[2].name, "shop-db-2");
    }

    #[test]
    fn pods_are_namespace_scoped() {
        let store = ClusterStore::open_in_memory().unwrap();
        let mut labels = stackforge_manifest::Labels::new();
        labels.insert("app".into(), "shop-db".into());
        store
            .put_pod(&PodInstance {
                name: "shop-db-0".into(),
                namespace: "staging".into(),
                workload: "shop-db".into(),
                labels,
            })
            .unwrap();

        assert!(store
            .list_pods_by_label("default", "app", "shop-db")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_pod_removes_it() {
        let store = ClusterStore::open_in_memory().unwrap();
        provision_database(&store, "shop-db");

        assert!(store.delete_pod("default", "shop-db-0").unwrap());
        assert!(!store.delete_pod("default", "shop-db-0").unwrap());
        assert!(store.get_pod("default", "shop-db-0").unwrap().is_none());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = ClusterStore::open(&db_path).unwrap();
            store.create_resource("prod", "shop-db", db_spec("postgres")).unwrap();
        }

        // Reopen the same database file.
        let store = ClusterStore::open(&db_path).unwrap();
        let resource = store
            .get_resource(ResourceKind::Database, "prod", "shop-db")
            .unwrap();
        assert!(resource.is_some());
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = ClusterStore::open_in_memory().unwrap();
        assert!(store.list_resources().unwrap().is_empty());
        assert!(store.get_workload("default", "x").unwrap().is_none());
        assert!(store.get_service("default", "x").unwrap().is_none());
        assert!(store.get_claim("default", "x").unwrap().is_none());
        assert!(store.list_pods_by_label("default", "app", "x").unwrap().is_empty());
        assert!(!store.delete_pod("default", "x").unwrap());
    }
}
