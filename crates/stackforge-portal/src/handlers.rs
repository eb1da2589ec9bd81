//! Portal handlers.
//!
//! Each handler validates input, reads/writes via `ClusterStore`, notifies
//! the dispatcher, and returns JSON responses.

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use tracing::info;

use stackforge_cluster::ClusterError;
use stackforge_core::{
    is_valid_name, BackendSpec, DatabaseSpec, FrontendSpec, ResourceKind, StackSpec,
};

use crate::PortalState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> axum::response::Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn store_error_response(err: &ClusterError) -> axum::response::Response {
    let status = match err {
        ClusterError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&err.to_string(), status)
}

// ── Form ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    namespace: String,
}

/// GET /
pub async fn index(State(state): State<PortalState>) -> Html<String> {
    let tmpl = IndexTemplate {
        namespace: state.namespace.clone(),
    };
    Html(
        tmpl.render()
            .unwrap_or_else(|e| format!("<pre>Template error: {e}</pre>")),
    )
}

// ── Deploy ─────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
pub struct DeployRequest {
    pub name: String,
    /// Database engine.
    pub db: String,
    /// Backend stack.
    pub be: String,
    /// Frontend framework.
    pub fe: String,
}

#[derive(serde::Serialize)]
struct DeployResponse {
    message: String,
    resources: Vec<String>,
}

/// POST /deploy
///
/// Creates the three wired tier resources `{name}-db`, `{name}-api`,
/// `{name}-ui` and notifies the dispatcher. Reconciliation order is the
/// dispatcher's problem; tiers are intentionally submitted without ordering
/// guarantees.
pub async fn deploy(
    State(state): State<PortalState>,
    Json(req): Json<DeployRequest>,
) -> impl IntoResponse {
    let db_name = format!("{}-db", req.name);
    let api_name = format!("{}-api", req.name);
    let ui_name = format!("{}-ui", req.name);

    if [&db_name, &api_name, &ui_name]
        .iter()
        .any(|n| !is_valid_name(n))
    {
        return error_response(
            &format!("'{}' is not a valid project name", req.name),
            StatusCode::BAD_REQUEST,
        );
    }

    let creations = [
        (
            db_name.clone(),
            StackSpec::Database(DatabaseSpec {
                engine: req.db,
                storage_size: None,
            }),
        ),
        (
            api_name.clone(),
            StackSpec::Backend(BackendSpec {
                stack: req.be,
                connect_to_database: db_name.clone(),
            }),
        ),
        (
            ui_name.clone(),
            StackSpec::Frontend(FrontendSpec {
                framework: req.fe,
                connect_to_backend: api_name.clone(),
            }),
        ),
    ];

    let mut created = Vec::new();
    for (name, spec) in creations {
        let kind = spec.kind();
        match state.store.create_resource(&state.namespace, &name, spec) {
            Ok(_) => created.push((kind, name)),
            Err(e) => return store_error_response(&e),
        }
    }

    for (kind, name) in &created {
        state.dispatch.applied(*kind, &state.namespace, name).await;
    }

    info!(project = %req.name, namespace = %state.namespace, "stack submitted");
    ApiResponse::ok(DeployResponse {
        message: format!("stack '{}' is launching", req.name),
        resources: created.into_iter().map(|(_, name)| name).collect(),
    })
    .into_response()
}

// ── Generic resource API ───────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
    pub spec: StackSpec,
}

/// POST /api/v1/{plural}
pub async fn create_resource(
    State(state): State<PortalState>,
    Path(plural): Path<String>,
    Json(req): Json<CreateResourceRequest>,
) -> impl IntoResponse {
    let Some(kind) = ResourceKind::from_plural(&plural) else {
        return error_response(
            &format!("unknown resource kind '{plural}'"),
            StatusCode::NOT_FOUND,
        );
    };
    if req.spec.kind() != kind {
        return error_response(
            &format!("spec does not match kind {kind}"),
            StatusCode::BAD_REQUEST,
        );
    }
    if !is_valid_name(&req.name) {
        return error_response(
            &format!("'{}' is not a valid resource name", req.name),
            StatusCode::BAD_REQUEST,
        );
    }

    match state
        .store
        .create_resource(&state.namespace, &req.name, req.spec)
    {
        Ok(resource) => {
            state
                .dispatch
                .applied(kind, &state.namespace, &req.name)
                .await;
            (StatusCode::CREATED, ApiResponse::ok(resource)).into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

/// GET /api/v1/stacks
pub async fn list_stacks(State(state): State<PortalState>) -> impl IntoResponse {
    match state.store.list_resources() {
        Ok(resources) => ApiResponse::ok(resources).into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// GET /api/v1/{plural}/{namespace}/{name}
pub async fn get_resource(
    State(state): State<PortalState>,
    Path((plural, namespace, name)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let Some(kind) = ResourceKind::from_plural(&plural) else {
        return error_response(
            &format!("unknown resource kind '{plural}'"),
            StatusCode::NOT_FOUND,
        );
    };
    match state.store.get_resource(kind, &namespace, &name) {
        Ok(Some(resource)) => ApiResponse::ok(resource).into_response(),
        Ok(None) => error_response("resource not found", StatusCode::NOT_FOUND),
        Err(e) => store_error_response(&e),
    }
}

/// DELETE /api/v1/{plural}/{namespace}/{name}
///
/// Deletion is asynchronous: the dispatcher performs the cascade, and any
/// in-flight redelivery for the identity stops on its own.
pub async fn delete_resource(
    State(state): State<PortalState>,
    Path((plural, namespace, name)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let Some(kind) = ResourceKind::from_plural(&plural) else {
        return error_response(
            &format!("unknown resource kind '{plural}'"),
            StatusCode::NOT_FOUND,
        );
    };
    match state.store.get_resource(kind, &namespace, &name) {
        Ok(Some(_)) => {
            state.dispatch.deleted(kind, &namespace, &name).await;
            (
                StatusCode::ACCEPTED,
                ApiResponse::ok(format!("deletion of '{namespace}/{name}' requested")),
            )
                .into_response()
        }
        Ok(None) => error_response("resource not found", StatusCode::NOT_FOUND),
        Err(e) => store_error_response(&e),
    }
}
