use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{ActivityLog, ActivitySubject};
use crate::database::store::Store;

/// Append an activity entry. Best effort: a failed write is logged, not returned.
pub async fn record(
    store: &dyn Store,
    workspace_id: Uuid,
    project_id: Option<Uuid>,
    actor_id: Uuid,
    action: &str,
    subject: ActivitySubject,
    details: Value,
) {
    let entry = ActivityLog::new(workspace_id, project_id, actor_id, action, subject, details);
    if let Err(e) = store.insert_activity(&entry).await {
        tracing::warn!("Failed to record activity '{}' in workspace {}: {}", action, workspace_id, e);
    }
}
