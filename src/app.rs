use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, require_membership};
use crate::services::{LogNotifier, ServiceContext};

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceContext,
}

impl AppState {
    pub fn new(services: ServiceContext) -> Self {
        Self { services }
    }

    /// Wire the configured storage backend with the default notifier
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let notifier = Arc::new(LogNotifier);
        let services = match config.database.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                ServiceContext::new(store.clone(), store, notifier, config.generation.clone())
            }
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                let store = Arc::new(PgStore::new(pool));
                ServiceContext::new(store.clone(), store, notifier, config.generation.clone())
            }
        };
        Ok(Self::new(services))
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let app = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    let app = if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };
    app.with_state(state)
}

/// Bearer token required; workspace-scoped routes also require membership
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route(
            "/api/workspaces",
            get(protected::workspaces::list).post(protected::workspaces::create),
        )
        .route("/api/admin/workspaces", get(elevated::workspaces_list))
        .merge(workspace_routes(state.clone()))
        .route_layer(from_fn_with_state(state, authenticate))
}

fn workspace_routes(state: AppState) -> Router<AppState> {
    use protected::{attachments, comments, members, projects, tasks, workspaces};

    const WS: &str = "/api/workspaces/:workspace_id";
    let at = |suffix: &str| format!("{}{}", WS, suffix);

    Router::new()
        .route(
            WS,
            get(workspaces::show).patch(workspaces::update).delete(workspaces::delete),
        )
        .route(&at("/members"), get(members::list).post(members::invite))
        .route(
            &at("/members/:user_id"),
            patch(members::change_role).delete(members::remove),
        )
        .route(&at("/leave"), post(members::leave))
        .route(&at("/labels"), get(workspaces::labels_list).post(workspaces::labels_create))
        .route(&at("/activity"), get(workspaces::activity))
        .route(&at("/projects"), get(projects::list).post(projects::create))
        .route(
            &at("/projects/:project_id"),
            get(projects::show).patch(projects::update).delete(projects::delete),
        )
        .route(&at("/projects/:project_id/tasks"), get(tasks::list).post(tasks::create))
        .route(
            &at("/projects/:project_id/tasks/:task_id"),
            get(tasks::show).patch(tasks::update).delete(tasks::delete),
        )
        .route(
            &at("/projects/:project_id/tasks/:task_id/comments"),
            get(comments::list).post(comments::create),
        )
        .route(
            &at("/projects/:project_id/tasks/:task_id/comments/:comment_id"),
            patch(comments::update).delete(comments::delete),
        )
        .route(&at("/attachments"), get(attachments::list).post(attachments::create))
        .route(&at("/attachments/:attachment_id"), delete(attachments::delete))
        .route_layer(from_fn_with_state(state, require_membership))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
