use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{resolve_access, Actor};

/// Resolve `:workspace_id` and the caller's membership, then hand the
/// `WorkspaceAccess` to the handler. Runs after `authenticate`.
pub async fn require_membership(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = request
        .extensions()
        .get::<Actor>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let raw = params
        .get("workspace_id")
        .ok_or_else(|| ApiError::bad_request("Missing workspace id"))?;
    let workspace_id = Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid workspace id '{}'", raw)))?;

    let access = resolve_access(state.services.store.as_ref(), workspace_id, actor).await?;
    request.extensions_mut().insert(access);
    Ok(next.run(request).await)
}
