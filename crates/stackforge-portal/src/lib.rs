//! stackforge-portal — the self-service boundary.
//!
//! Serves the deploy form and the JSON API. The portal is pure glue: it
//! validates input, creates declared resources in the cluster store, and
//! notifies the dispatcher — all reconciliation happens elsewhere, and users
//! watch progress through the resources' reported status.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Deploy form |
//! | POST | `/deploy` | Create a db/api/ui stack from `{name, db, be, fe}` |
//! | GET | `/api/v1/stacks` | List all declared resources with status |
//! | POST | `/api/v1/{plural}` | Create one resource of the given kind |
//! | GET | `/api/v1/{plural}/{namespace}/{name}` | Get one resource |
//! | DELETE | `/api/v1/{plural}/{namespace}/{name}` | Delete (cascades) |

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use stackforge_cluster::ClusterStore;
use stackforge_reconcile::DispatchHandle;

/// Shared state for portal handlers.
#[derive(Clone)]
pub struct PortalState {
    pub store: ClusterStore,
    pub dispatch: DispatchHandle,
    /// Namespace all portal-created resources land in.
    pub namespace: String,
}

/// Build the portal router.
pub fn build_router(state: PortalState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/deploy", post(handlers::deploy))
        .route("/api/v1/stacks", get(handlers::list_stacks))
        .route("/api/v1/{plural}", post(handlers::create_resource))
        .route(
            "/api/v1/{plural}/{namespace}/{name}",
            get(handlers::get_resource).delete(handlers::delete_resource),
        )
        .with_state(state)
}
