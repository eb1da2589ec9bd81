//! Event dispatch.
//!
//! An explicit kind→reconciler table driven by an mpsc queue. This is the
//! seam where the platform's watch mechanism would plug in: anything that
//! creates or deletes a declared resource sends an identity-only event, and
//! the loop re-fetches the current spec at delivery time. Redelivered events
//! therefore always see fresh state, and dispatch for an identity that has
//! been deleted simply stops.
//!
//! The loop is a single consumer, so delivery is serialized per resource
//! identity (conservatively, across identities too). Requeue is cooperative:
//! a suspended pass returns its delay and a spawned timer re-enqueues the
//! identity — the reconciler itself never sleeps.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use stackforge_cluster::ClusterStore;
use stackforge_core::{ResourceKind, StackPhase, StackStatus};

use crate::Reconciler;

/// A resource notification, by identity. The dispatcher re-reads the spec
/// from the store when the event is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The resource was created or updated.
    Applied {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
    /// The resource was deleted; owned children must be garbage-collected.
    Deleted {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
}

/// Cloneable sender half, handed to whatever produces events (the portal,
/// tests, a future watch adapter).
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<Event>,
}

impl DispatchHandle {
    /// Notify that a resource was created or updated.
    pub async fn applied(&self, kind: ResourceKind, namespace: &str, name: &str) {
        self.send(Event::Applied {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
        .await;
    }

    /// Notify that a resource was deleted.
    pub async fn deleted(&self, kind: ResourceKind, namespace: &str, name: &str) {
        self.send(Event::Deleted {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
        .await;
    }

    async fn send(&self, event: Event) {
        if self.tx.send(event).await.is_err() {
            warn!("dispatcher is gone, dropping event");
        }
    }
}

/// The dispatcher owns the event queue and the reconciler registry.
pub struct Dispatcher {
    store: ClusterStore,
    reconcilers: HashMap<ResourceKind, Arc<dyn Reconciler>>,
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
}

impl Dispatcher {
    /// Create a dispatcher over the given store.
    pub fn new(store: ClusterStore) -> Self {
        let (tx, rx) = mpsc::channel(256);
        Self {
            store,
            reconcilers: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Register a reconciler under the kind it reports.
    pub fn register(&mut self, reconciler: Arc<dyn Reconciler>) {
        let kind = reconciler.kind();
        if self.reconcilers.insert(kind, reconciler).is_some() {
            warn!(%kind, "reconciler re-registered, replacing previous");
        }
    }

    /// Sender half for event producers.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run the dispatch loop until the shutdown signal flips.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(kinds = self.reconcilers.len(), "dispatcher started");
        loop {
            tokio::select! {
                event = self.rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        // All senders (including our own requeue timers)
                        // gone; nothing can ever arrive again.
                        None => break,
                    }
                }
                _ = shutdown.changed() => {
                    info!("dispatcher shutting down");
                    break;
                }
            }
        }
    }

    fn handle_event(&self, event: Event) {
        match event {
            Event::Applied {
                kind,
                namespace,
                name,
            } => self.handle_applied(kind, &namespace, &name),
            Event::Deleted {
                kind,
                namespace,
                name,
            } => self.handle_deleted(kind, &namespace, &name),
        }
    }

    fn handle_applied(&self, kind: ResourceKind, namespace: &str, name: &str) {
        // Re-fetch at delivery time; a stale event for a deleted resource
        // is dropped here.
        let resource = match self.store.get_resource(kind, namespace, name) {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                debug!(%kind, %namespace, %name, "resource gone, skipping delivery");
                return;
            }
            Err(e) => {
                error!(%kind, %namespace, %name, error = %e, "failed to load resource");
                return;
            }
        };

        let Some(reconciler) = self.reconcilers.get(&kind) else {
            warn!(%kind, "no reconciler registered for kind");
            return;
        };

        let result = reconciler.reconcile(&self.store, &resource);
        let status = match &result {
            Ok(status) => status.clone(),
            Err(err) => StackStatus::from_error(err),
        };
        match status.phase {
            StackPhase::Ready => {
                info!(%kind, %namespace, %name, message = %status.message, "reconciled")
            }
            StackPhase::Failed => {
                warn!(%kind, %namespace, %name, message = %status.message, "reconcile failed permanently")
            }
            _ => {
                debug!(%kind, %namespace, %name, phase = %status.phase, message = %status.message, "reconcile suspended")
            }
        }

        match self.store.put_status(kind, namespace, name, &status) {
            Ok(true) => {}
            Ok(false) => {
                // Deleted while we were reconciling; do not requeue.
                debug!(%kind, %namespace, %name, "resource deleted mid-pass");
                return;
            }
            Err(e) => {
                error!(%kind, %namespace, %name, error = %e, "failed to persist status");
            }
        }

        if let Err(err) = result {
            if let Some(delay) = err.requeue_after() {
                let tx = self.tx.clone();
                let namespace = namespace.to_string();
                let name = name.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx
                        .send(Event::Applied {
                            kind,
                            namespace,
                            name,
                        })
                        .await;
                });
            }
        }
    }

    fn handle_deleted(&self, kind: ResourceKind, namespace: &str, name: &str) {
        match self.store.delete_resource(kind, namespace, name) {
            Ok(true) => info!(%kind, %namespace, %name, "resource deleted, children cascaded"),
            Ok(false) => debug!(%kind, %namespace, %name, "delete for unknown resource"),
            Err(e) => error!(%kind, %namespace, %name, error = %e, "cascade delete failed"),
        }
    }
}
