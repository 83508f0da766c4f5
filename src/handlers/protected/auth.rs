use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Actor;

/// GET /api/auth/whoami
pub async fn whoami(Extension(actor): Extension<Actor>) -> ApiResult<Actor> {
    Ok(ApiResponse::success(actor))
}
