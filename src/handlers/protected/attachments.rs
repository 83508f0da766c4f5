use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Attachment, AttachmentTarget};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::attachment_service::CreateAttachment;
use crate::services::WorkspaceAccess;

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub target_type: String,
    pub target_id: Uuid,
}

/// GET /api/workspaces/:workspace_id/attachments?target_type=TASK&target_id=...
pub async fn list(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    query: Result<Query<TargetQuery>, QueryRejection>,
) -> ApiResult<Vec<Attachment>> {
    let Query(query) = query?;
    let target = AttachmentTarget::from_parts(&query.target_type.to_uppercase(), query.target_id).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown target_type '{}': expected PROJECT, TASK or COMMENT",
            query.target_type
        ))
    })?;
    Ok(ApiResponse::success(state.services.attachments().list(&access, target).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    payload: Result<Json<CreateAttachment>, JsonRejection>,
) -> ApiResult<Attachment> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.services.attachments().create(&access, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(access): Extension<WorkspaceAccess>,
    Path((_, attachment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.services.attachments().delete(&access, attachment_id).await?;
    Ok(ApiResponse::no_content())
}
