use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    ActivityLog, Attachment, AttachmentTarget, Comment, Label, Membership, Project, Role, Task, User, Workspace,
};

/// Uniqueness constraints the storage layer enforces at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Global, among non-deleted workspaces
    WorkspaceSlug,
    /// Per workspace, among all projects regardless of delete state
    ProjectKey,
    /// Per project, among non-deleted tasks
    TicketNumber,
    /// Per (workspace, user), among non-deleted memberships
    Membership,
    /// One live OWNER membership per workspace
    WorkspaceOwner,
    /// Per workspace, among non-deleted labels
    LabelName,
    UserEmail,
}

impl Constraint {
    /// Index names used by the Postgres schema
    pub fn index_name(&self) -> &'static str {
        match self {
            Constraint::WorkspaceSlug => "workspaces_slug_active_key",
            Constraint::ProjectKey => "projects_workspace_key_key",
            Constraint::TicketNumber => "tasks_project_ticket_active_key",
            Constraint::Membership => "memberships_workspace_user_active_key",
            Constraint::WorkspaceOwner => "memberships_workspace_owner_active_key",
            Constraint::LabelName => "labels_workspace_name_active_key",
            Constraint::UserEmail => "users_email_key",
        }
    }

    pub fn from_index_name(name: &str) -> Option<Self> {
        [
            Constraint::WorkspaceSlug,
            Constraint::ProjectKey,
            Constraint::TicketNumber,
            Constraint::Membership,
            Constraint::WorkspaceOwner,
            Constraint::LabelName,
            Constraint::UserEmail,
        ]
        .into_iter()
        .find(|c| c.index_name() == name)
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.index_name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(Constraint),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write found the row no longer in the state it was read in
    #[error("Changed concurrently: {0}")]
    Stale(String),

    #[error("Unsupported soft-delete scope {scope} for {collection:?}")]
    UnsupportedScope { collection: Collection, scope: &'static str },

    #[error(transparent)]
    Database(#[from] crate::database::manager::DatabaseError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                if let Some(constraint) = db_err.constraint().and_then(Constraint::from_index_name) {
                    return StoreError::Conflict(constraint);
                }
            }
        }
        StoreError::Sqlx(err)
    }
}

impl StoreError {
    pub fn is_conflict_on(&self, constraint: Constraint) -> bool {
        matches!(self, StoreError::Conflict(c) if *c == constraint)
    }

    /// The backend could not be reached, as opposed to rejecting the operation
    pub fn is_unavailable(&self) -> bool {
        let sqlx_err = match self {
            StoreError::Sqlx(e) => e,
            StoreError::Database(crate::database::manager::DatabaseError::Sqlx(e)) => e,
            _ => return false,
        };
        matches!(
            sqlx_err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collections that carry a `deleted_at` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Workspaces,
    Memberships,
    Labels,
    Projects,
    Tasks,
    Comments,
    Attachments,
    ActivityLogs,
}

impl Collection {
    /// Scopes a collection can be filtered by; anything else is a caller bug
    pub fn supports(&self, scope: &Scope) -> bool {
        use Collection::*;
        match scope {
            Scope::Ids(_) => true,
            Scope::Workspace(_) => !matches!(self, Workspaces),
            Scope::Projects(_) => matches!(self, Tasks | Attachments | ActivityLogs),
            Scope::Tasks(_) => matches!(self, Comments),
            Scope::Targets(_) => matches!(self, Attachments),
        }
    }
}

/// Which rows of a collection a batch soft-delete touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Ids(Vec<Uuid>),
    Workspace(Uuid),
    Projects(Vec<Uuid>),
    Tasks(Vec<Uuid>),
    /// Attachments only
    Targets(Vec<AttachmentTarget>),
}

impl Scope {
    pub fn name(&self) -> &'static str {
        match self {
            Scope::Ids(_) => "ids",
            Scope::Workspace(_) => "workspace",
            Scope::Projects(_) => "projects",
            Scope::Tasks(_) => "tasks",
            Scope::Targets(_) => "targets",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Scope::Ids(v) | Scope::Projects(v) | Scope::Tasks(v) => v.is_empty(),
            Scope::Targets(v) => v.is_empty(),
            Scope::Workspace(_) => false,
        }
    }
}

/// User lookups. Accounts are managed outside workspace logic.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
}

/// Entity persistence. Every `find_*`/`list_*` skips soft-deleted rows unless stated.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // Workspaces
    async fn insert_workspace(&self, workspace: &Workspace) -> StoreResult<()>;
    async fn find_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>>;
    async fn workspace_slug_in_use(&self, slug: &str) -> StoreResult<bool>;
    async fn update_workspace(&self, workspace: &Workspace) -> StoreResult<()>;
    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>>;
    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<(Workspace, Role)>>;
    /// Soft-deleted workspaces, for reconciliation
    async fn list_deleted_workspaces(&self) -> StoreResult<Vec<Workspace>>;

    // Memberships
    async fn insert_membership(&self, membership: &Membership) -> StoreResult<()>;
    async fn find_membership(&self, workspace_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>>;
    async fn list_memberships(&self, workspace_id: Uuid) -> StoreResult<Vec<Membership>>;
    /// Applies only while the membership is live and still holds `expected`
    async fn update_membership_role(&self, membership_id: Uuid, expected: Role, role: Role) -> StoreResult<()>;
    /// Soft-deletes only while the membership is live and still holds `expected`
    async fn end_membership(&self, membership_id: Uuid, expected: Role, at: DateTime<Utc>) -> StoreResult<()>;

    // Projects
    async fn insert_project(&self, project: &Project) -> StoreResult<()>;
    async fn find_project(&self, workspace_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>>;
    /// Includes soft-deleted projects; keys are never reused
    async fn project_key_in_use(&self, workspace_id: Uuid, key: &str) -> StoreResult<bool>;
    async fn list_projects(&self, workspace_id: Uuid) -> StoreResult<Vec<Project>>;
    async fn update_project(&self, project: &Project) -> StoreResult<()>;

    // Tasks
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;
    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>>;
    async fn max_ticket_number(&self, project_id: Uuid) -> StoreResult<Option<i32>>;
    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;
    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    // Labels
    async fn insert_label(&self, label: &Label) -> StoreResult<()>;
    async fn list_labels(&self, workspace_id: Uuid) -> StoreResult<Vec<Label>>;

    // Comments
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn find_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<Option<Comment>>;
    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, comment: &Comment) -> StoreResult<()>;

    // Attachments
    async fn insert_attachment(&self, attachment: &Attachment) -> StoreResult<()>;
    async fn find_attachment(&self, workspace_id: Uuid, attachment_id: Uuid) -> StoreResult<Option<Attachment>>;
    async fn list_attachments(&self, target: AttachmentTarget) -> StoreResult<Vec<Attachment>>;
    /// Project a live target belongs to, if the target is live and in this workspace
    async fn target_project(&self, workspace_id: Uuid, target: AttachmentTarget) -> StoreResult<Option<Uuid>>;

    // Activity
    async fn insert_activity(&self, entry: &ActivityLog) -> StoreResult<()>;
    /// Newest first
    async fn list_activity(&self, workspace_id: Uuid, limit: i64) -> StoreResult<Vec<ActivityLog>>;

    // Batch soft-delete
    /// Sets `deleted_at = at` on every non-deleted row in scope; returns rows touched
    async fn soft_delete(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<u64>;
    /// Ids of rows in scope whose `deleted_at` equals `at`
    async fn ids_deleted_at(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<Vec<Uuid>>;
}
