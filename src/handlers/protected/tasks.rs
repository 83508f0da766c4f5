use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::task_service::{CreateTask, TaskView, UpdateTask};
use crate::services::WorkspaceAccess;

pub async fn list(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Vec<TaskView>> {
    Ok(ApiResponse::success(state.services.tasks().list(&access, project_id).await?))
}

/// POST .../projects/:project_id/tasks - numbered from the project's sequence
pub async fn create(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<TaskView> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(
        state.services.tasks().create(&access, project_id, input).await?,
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<TaskView> {
    Ok(ApiResponse::success(
        state.services.tasks().get(&access, project_id, task_id).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<TaskView> {
    let Json(input) = payload?;
    Ok(ApiResponse::success(
        state.services.tasks().update(&access, project_id, task_id, input).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<()> {
    state.services.tasks().delete(&access, project_id, task_id).await?;
    Ok(ApiResponse::no_content())
}
