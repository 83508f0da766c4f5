use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Workspace;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Actor;

/// GET /api/admin/workspaces - every live workspace, super admins only
pub async fn workspaces_list(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> ApiResult<Vec<Workspace>> {
    let workspaces = state.services.workspaces().list_all(&actor).await?;
    Ok(ApiResponse::success(workspaces))
}
