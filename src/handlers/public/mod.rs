use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Taskdeck API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/whoami (protected)",
                "workspaces": "/api/workspaces[/:workspace_id] (protected, membership)",
                "members": "/api/workspaces/:workspace_id/members[/:user_id] (protected, membership)",
                "projects": "/api/workspaces/:workspace_id/projects[/:project_id] (protected, membership)",
                "tasks": "/api/workspaces/:workspace_id/projects/:project_id/tasks[/:task_id] (protected, membership)",
                "attachments": "/api/workspaces/:workspace_id/attachments (protected, membership)",
                "admin": "/api/admin/workspaces (super admin)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.services.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
