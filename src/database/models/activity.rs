use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

/// Entity an activity entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivitySubject {
    Workspace(Uuid),
    Member(Uuid),
    Project(Uuid),
    Task(Uuid),
    Comment(Uuid),
    Label(Uuid),
    Attachment(Uuid),
}

impl ActivitySubject {
    pub fn kind(&self) -> &'static str {
        match self {
            ActivitySubject::Workspace(_) => "WORKSPACE",
            ActivitySubject::Member(_) => "MEMBER",
            ActivitySubject::Project(_) => "PROJECT",
            ActivitySubject::Task(_) => "TASK",
            ActivitySubject::Comment(_) => "COMMENT",
            ActivitySubject::Label(_) => "LABEL",
            ActivitySubject::Attachment(_) => "ATTACHMENT",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ActivitySubject::Workspace(id)
            | ActivitySubject::Member(id)
            | ActivitySubject::Project(id)
            | ActivitySubject::Task(id)
            | ActivitySubject::Comment(id)
            | ActivitySubject::Label(id)
            | ActivitySubject::Attachment(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        let subject = match kind {
            "WORKSPACE" => ActivitySubject::Workspace(id),
            "MEMBER" => ActivitySubject::Member(id),
            "PROJECT" => ActivitySubject::Project(id),
            "TASK" => ActivitySubject::Task(id),
            "COMMENT" => ActivitySubject::Comment(id),
            "LABEL" => ActivitySubject::Label(id),
            "ATTACHMENT" => ActivitySubject::Attachment(id),
            _ => return None,
        };
        Some(subject)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub project_id: Option<Uuid>,
    pub actor_id: Uuid,
    /// Dotted verb, e.g. `task.created`
    pub action: String,
    pub subject: ActivitySubject,
    pub details: Value,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ActivityLog {
    pub fn new(
        workspace_id: Uuid,
        project_id: Option<Uuid>,
        actor_id: Uuid,
        action: impl Into<String>,
        subject: ActivitySubject,
        details: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            project_id,
            actor_id,
            action: action.into(),
            subject,
            details,
            created_at: crate::database::now(),
            deleted_at: None,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for ActivityLog {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("subject_kind")?;
        let subject_id: Uuid = row.try_get("subject_id")?;
        let subject = ActivitySubject::from_parts(&kind, subject_id).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "subject_kind".to_string(),
            source: format!("unknown activity subject kind '{}'", kind).into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            workspace_id: row.try_get("workspace_id")?,
            project_id: row.try_get("project_id")?,
            actor_id: row.try_get("actor_id")?,
            action: row.try_get("action")?,
            subject,
            details: row.try_get("details")?,
            created_at: row.try_get("created_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}
