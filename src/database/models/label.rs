use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Label {
    pub fn new(workspace_id: Uuid, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            color: color.into(),
            created_at: crate::database::now(),
            deleted_at: None,
        }
    }
}

/// Labels seeded into every new workspace
pub const DEFAULT_LABELS: [(&str, &str); 4] = [
    ("Bug", "#ef4444"),
    ("Feature", "#3b82f6"),
    ("Improvement", "#10b981"),
    ("Documentation", "#8b5cf6"),
];
