use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// What an attachment hangs off. Stored as a (kind, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentTarget {
    Project(Uuid),
    Task(Uuid),
    Comment(Uuid),
}

impl AttachmentTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            AttachmentTarget::Project(_) => "PROJECT",
            AttachmentTarget::Task(_) => "TASK",
            AttachmentTarget::Comment(_) => "COMMENT",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            AttachmentTarget::Project(id) | AttachmentTarget::Task(id) | AttachmentTarget::Comment(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "PROJECT" => Some(AttachmentTarget::Project(id)),
            "TASK" => Some(AttachmentTarget::Task(id)),
            "COMMENT" => Some(AttachmentTarget::Comment(id)),
            _ => None,
        }
    }
}

/// File metadata; the bytes live in an external object store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub project_id: Uuid,
    pub target: AttachmentTarget,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for Attachment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("target_kind")?;
        let target_id: Uuid = row.try_get("target_id")?;
        let target = AttachmentTarget::from_parts(&kind, target_id).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "target_kind".to_string(),
            source: format!("unknown attachment target kind '{}'", kind).into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            workspace_id: row.try_get("workspace_id")?,
            project_id: row.try_get("project_id")?,
            target,
            uploaded_by: row.try_get("uploaded_by")?,
            file_name: row.try_get("file_name")?,
            mime_type: row.try_get("mime_type")?,
            size_bytes: row.try_get("size_bytes")?,
            url: row.try_get("url")?,
            created_at: row.try_get("created_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}
