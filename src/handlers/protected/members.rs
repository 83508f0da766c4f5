use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Membership;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::membership_service::{ChangeRole, InviteMember, Member};
use crate::services::WorkspaceAccess;

pub async fn list(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<Vec<Member>> {
    Ok(ApiResponse::success(state.services.members().list(&access).await?))
}

/// POST /api/workspaces/:workspace_id/members - invite by email
pub async fn invite(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    payload: Result<Json<InviteMember>, JsonRejection>,
) -> ApiResult<Membership> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.services.members().invite(&access, input).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<ChangeRole>, JsonRejection>,
) -> ApiResult<Membership> {
    let Json(input) = payload?;
    Ok(ApiResponse::success(
        state.services.members().change_role(&access, user_id, input).await?,
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.services.members().remove(&access, user_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/workspaces/:workspace_id/leave
pub async fn leave(State(state): State<AppState>, Extension(access): Extension<WorkspaceAccess>) -> ApiResult<()> {
    state.services.members().leave(&access).await?;
    Ok(ApiResponse::no_content())
}
