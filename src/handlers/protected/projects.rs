use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::project_service::{CreateProject, UpdateProject};
use crate::services::WorkspaceAccess;

pub async fn list(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<Vec<Project>> {
    Ok(ApiResponse::success(state.services.projects().list(&access).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    payload: Result<Json<CreateProject>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.services.projects().create(&access, input).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Project> {
    Ok(ApiResponse::success(state.services.projects().get(&access, project_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateProject>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;
    Ok(ApiResponse::success(
        state.services.projects().update(&access, project_id, input).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.services.projects().delete(&access, project_id).await?;
    Ok(ApiResponse::no_content())
}
