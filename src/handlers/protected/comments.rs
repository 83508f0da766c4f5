use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Comment;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::comment_service::{CommentBody, TaskRef};
use crate::services::WorkspaceAccess;

pub async fn list(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Vec<Comment>> {
    let at = TaskRef { project_id, task_id };
    Ok(ApiResponse::success(state.services.comments().list(&access, at).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<Comment> {
    let Json(input) = payload?;
    let at = TaskRef { project_id, task_id };
    Ok(ApiResponse::created(state.services.comments().create(&access, at, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id, comment_id)): Path<(Uuid, Uuid, Uuid, Uuid)>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<Comment> {
    let Json(input) = payload?;
    let at = TaskRef { project_id, task_id };
    Ok(ApiResponse::success(
        state.services.comments().update(&access, at, comment_id, input).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, project_id, task_id, comment_id)): Path<(Uuid, Uuid, Uuid, Uuid)>,
) -> ApiResult<()> {
    let at = TaskRef { project_id, task_id };
    state.services.comments().delete(&access, at, comment_id).await?;
    Ok(ApiResponse::no_content())
}
