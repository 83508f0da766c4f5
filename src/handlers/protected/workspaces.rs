use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::{ActivityLog, Label, Workspace};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::workspace_service::{CreateLabel, CreateWorkspace, UpdateWorkspace, WorkspaceSummary};
use crate::services::{Actor, WorkspaceAccess};

/// GET /api/workspaces - the caller's workspaces with their role in each
pub async fn list(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> ApiResult<Vec<WorkspaceSummary>> {
    Ok(ApiResponse::success(state.services.workspaces().list_for_user(&actor).await?))
}

/// POST /api/workspaces
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreateWorkspace>, JsonRejection>,
) -> ApiResult<WorkspaceSummary> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.services.workspaces().create(&actor, input).await?))
}

pub async fn show(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<WorkspaceSummary> {
    Ok(ApiResponse::success(state.services.workspaces().get(&access)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    payload: Result<Json<UpdateWorkspace>, JsonRejection>,
) -> ApiResult<Workspace> {
    let Json(input) = payload?;
    Ok(ApiResponse::success(state.services.workspaces().update(&access, input).await?))
}

pub async fn delete(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<()> {
    state.services.workspaces().delete(&access).await?;
    Ok(ApiResponse::no_content())
}

pub async fn labels_list(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<Vec<Label>> {
    Ok(ApiResponse::success(state.services.workspaces().list_labels(&access).await?))
}

pub async fn labels_create(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    payload: Result<Json<CreateLabel>, JsonRejection>,
) -> ApiResult<Label> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.services.workspaces().create_label(&access, input).await?))
}

/// GET /api/workspaces/:workspace_id/activity - newest first
pub async fn activity(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<Vec<ActivityLog>> {
    Ok(ApiResponse::success(state.services.workspaces().list_activity(&access).await?))
}
