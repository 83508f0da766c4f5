use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    FromRow, PgPool, Postgres, Row,
};
use uuid::Uuid;

use crate::database::models::{
    ActivityLog, Attachment, AttachmentTarget, Comment, Label, Membership, Project, Role, Task, User, Workspace,
};
use crate::database::store::{Collection, IdentityStore, Scope, Store, StoreError, StoreResult};

const WORKSPACE_COLUMNS: &str = "w.id, w.name, w.slug, w.description, w.owner_id, \
    w.allow_member_project_creation, w.created_at, w.updated_at, w.deleted_at";
const MEMBERSHIP_COLUMNS: &str = "id, workspace_id, user_id, role, invited_by, joined_at, deleted_at";
const PROJECT_COLUMNS: &str = "id, workspace_id, name, key, description, owner_id, status, \
    start_date, end_date, created_at, updated_at, deleted_at";
const TASK_COLUMNS: &str = "id, workspace_id, project_id, ticket_number, title, description, status, \
    priority, reporter_id, assignee_ids, label_ids, due_date, created_at, updated_at, deleted_at";
const ATTACHMENT_COLUMNS: &str = "id, workspace_id, project_id, target_kind, target_id, uploaded_by, \
    file_name, mime_type, size_bytes, url, created_at, deleted_at";

/// Postgres-backed persistence. Uniqueness rules are enforced by the partial
/// unique indexes in the migrations and surface as `StoreError::Conflict`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct WorkspaceWithRole {
    #[sqlx(flatten)]
    workspace: Workspace,
    role: Role,
}

enum ScopeBind {
    One(Uuid),
    Many(Vec<Uuid>),
    Targets(Vec<String>, Vec<Uuid>),
}

/// SQL filter for a soft-delete scope; placeholders start at $2 ($1 is the timestamp)
fn scope_filter(collection: Collection, scope: Scope) -> StoreResult<(&'static str, ScopeBind)> {
    if !collection.supports(&scope) {
        return Err(StoreError::UnsupportedScope { collection, scope: scope.name() });
    }

    let filter = match scope {
        Scope::Ids(ids) => ("id = ANY($2)", ScopeBind::Many(ids)),
        Scope::Workspace(id) => ("workspace_id = $2", ScopeBind::One(id)),
        Scope::Projects(ids) => ("project_id = ANY($2)", ScopeBind::Many(ids)),
        Scope::Tasks(ids) => ("task_id = ANY($2)", ScopeBind::Many(ids)),
        Scope::Targets(targets) => {
            let kinds = targets.iter().map(|t| t.kind().to_string()).collect();
            let ids = targets.iter().map(|t| t.id()).collect();
            (
                "(target_kind, target_id) IN (SELECT * FROM UNNEST($2::text[], $3::uuid[]))",
                ScopeBind::Targets(kinds, ids),
            )
        }
    };
    Ok(filter)
}

fn table_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Workspaces => "workspaces",
        Collection::Memberships => "memberships",
        Collection::Labels => "labels",
        Collection::Projects => "projects",
        Collection::Tasks => "tasks",
        Collection::Comments => "comments",
        Collection::Attachments => "attachments",
        Collection::ActivityLogs => "activity_logs",
    }
}

fn bind_scope<'q>(query: Query<'q, Postgres, PgArguments>, bind: ScopeBind) -> Query<'q, Postgres, PgArguments> {
    match bind {
        ScopeBind::One(id) => query.bind(id),
        ScopeBind::Many(ids) => query.bind(ids),
        ScopeBind::Targets(kinds, ids) => query.bind(kinds).bind(ids),
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, is_active, is_super_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, is_active, is_super_admin, created_at FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, is_active, is_super_admin, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.is_super_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workspaces
                (id, name, slug, description, owner_id, allow_member_project_creation, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(&workspace.slug)
        .bind(&workspace.description)
        .bind(workspace.owner_id)
        .bind(workspace.settings.allow_member_project_creation)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .bind(workspace.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>> {
        let sql = format!("SELECT {} FROM workspaces w WHERE w.id = $1 AND w.deleted_at IS NULL", WORKSPACE_COLUMNS);
        let workspace = sqlx::query_as::<_, Workspace>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(workspace)
    }

    async fn workspace_slug_in_use(&self, slug: &str) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspaces WHERE slug = $1 AND deleted_at IS NULL)",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE workspaces
            SET name = $2, description = $3, allow_member_project_creation = $4, updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(workspace.settings.allow_member_project_creation)
        .bind(workspace.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("workspace {}", workspace.id)));
        }
        Ok(())
    }

    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let sql = format!(
            "SELECT {} FROM workspaces w WHERE w.deleted_at IS NULL ORDER BY w.created_at DESC",
            WORKSPACE_COLUMNS
        );
        let workspaces = sqlx::query_as::<_, Workspace>(&sql).fetch_all(&self.pool).await?;
        Ok(workspaces)
    }

    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<(Workspace, Role)>> {
        let sql = format!(
            r#"
            SELECT {}, m.role
            FROM workspaces w
            JOIN memberships m ON m.workspace_id = w.id AND m.deleted_at IS NULL
            WHERE m.user_id = $1 AND w.deleted_at IS NULL
            ORDER BY w.created_at DESC
            "#,
            WORKSPACE_COLUMNS
        );
        let rows = sqlx::query_as::<_, WorkspaceWithRole>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| (r.workspace, r.role)).collect())
    }

    async fn list_deleted_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let sql = format!(
            "SELECT {} FROM workspaces w WHERE w.deleted_at IS NOT NULL ORDER BY w.deleted_at",
            WORKSPACE_COLUMNS
        );
        let workspaces = sqlx::query_as::<_, Workspace>(&sql).fetch_all(&self.pool).await?;
        Ok(workspaces)
    }

    async fn insert_membership(&self, membership: &Membership) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO memberships (id, workspace_id, user_id, role, invited_by, joined_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(membership.id)
        .bind(membership.workspace_id)
        .bind(membership.user_id)
        .bind(membership.role)
        .bind(membership.invited_by)
        .bind(membership.joined_at)
        .bind(membership.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_membership(&self, workspace_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let sql = format!(
            "SELECT {} FROM memberships WHERE workspace_id = $1 AND user_id = $2 AND deleted_at IS NULL",
            MEMBERSHIP_COLUMNS
        );
        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(workspace_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(membership)
    }

    async fn list_memberships(&self, workspace_id: Uuid) -> StoreResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {} FROM memberships WHERE workspace_id = $1 AND deleted_at IS NULL ORDER BY joined_at",
            MEMBERSHIP_COLUMNS
        );
        let memberships = sqlx::query_as::<_, Membership>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(memberships)
    }

    async fn update_membership_role(&self, membership_id: Uuid, expected: Role, role: Role) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE memberships SET role = $2 WHERE id = $1 AND role = $3 AND deleted_at IS NULL")
                .bind(membership_id)
                .bind(role)
                .bind(expected)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Stale(format!("membership {}", membership_id)));
        }
        Ok(())
    }

    async fn end_membership(&self, membership_id: Uuid, expected: Role, at: DateTime<Utc>) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE memberships SET deleted_at = $2 WHERE id = $1 AND role = $3 AND deleted_at IS NULL")
                .bind(membership_id)
                .bind(at)
                .bind(expected)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Stale(format!("membership {}", membership_id)));
        }
        Ok(())
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, workspace_id, name, key, description, owner_id, status, start_date, end_date,
                 created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(project.id)
        .bind(project.workspace_id)
        .bind(&project.name)
        .bind(&project.key)
        .bind(&project.description)
        .bind(project.owner_id)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.created_at)
        .bind(project.updated_at)
        .bind(project.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_project(&self, workspace_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(project_id)
            .bind(workspace_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn project_key_in_use(&self, workspace_id: Uuid, key: &str) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE workspace_id = $1 AND key = $2)",
        )
        .bind(workspace_id)
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list_projects(&self, workspace_id: Uuid) -> StoreResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE workspace_id = $1 AND deleted_at IS NULL ORDER BY created_at",
            PROJECT_COLUMNS
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, description = $3, status = $4, start_date = $5, end_date = $6, updated_at = $7
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("project {}", project.id)));
        }
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (id, workspace_id, project_id, ticket_number, title, description, status, priority,
                 reporter_id, assignee_ids, label_ids, due_date, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(task.id)
        .bind(task.workspace_id)
        .bind(task.project_id)
        .bind(task.ticket_number)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.reporter_id)
        .bind(&task.assignee_ids)
        .bind(&task.label_ids)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND project_id = $2 AND deleted_at IS NULL",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn max_ticket_number(&self, project_id: Uuid) -> StoreResult<Option<i32>> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(ticket_number) FROM tasks WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE project_id = $1 AND deleted_at IS NULL ORDER BY ticket_number",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql).bind(project_id).fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5, assignee_ids = $6,
                label_ids = $7, due_date = $8, updated_at = $9
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(&task.assignee_ids)
        .bind(&task.label_ids)
        .bind(task.due_date)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("task {}", task.id)));
        }
        Ok(())
    }

    async fn insert_label(&self, label: &Label) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO labels (id, workspace_id, name, color, created_at, deleted_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(label.id)
        .bind(label.workspace_id)
        .bind(&label.name)
        .bind(&label.color)
        .bind(label.created_at)
        .bind(label.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_labels(&self, workspace_id: Uuid) -> StoreResult<Vec<Label>> {
        let labels = sqlx::query_as::<_, Label>(
            r#"
            SELECT id, workspace_id, name, color, created_at, deleted_at
            FROM labels WHERE workspace_id = $1 AND deleted_at IS NULL ORDER BY name
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(labels)
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, workspace_id, task_id, author_id, body, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(comment.id)
        .bind(comment.workspace_id)
        .bind(comment.task_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(comment.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, workspace_id, task_id, author_id, body, created_at, updated_at, deleted_at
            FROM comments WHERE id = $1 AND task_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(comment_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, workspace_id, task_id, author_id, body, created_at, updated_at, deleted_at
            FROM comments WHERE task_id = $1 AND deleted_at IS NULL ORDER BY created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let result = sqlx::query("UPDATE comments SET body = $2, updated_at = $3 WHERE id = $1 AND deleted_at IS NULL")
            .bind(comment.id)
            .bind(&comment.body)
            .bind(comment.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("comment {}", comment.id)));
        }
        Ok(())
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attachments
                (id, workspace_id, project_id, target_kind, target_id, uploaded_by, file_name, mime_type,
                 size_bytes, url, created_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(attachment.id)
        .bind(attachment.workspace_id)
        .bind(attachment.project_id)
        .bind(attachment.target.kind())
        .bind(attachment.target.id())
        .bind(attachment.uploaded_by)
        .bind(&attachment.file_name)
        .bind(&attachment.mime_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.url)
        .bind(attachment.created_at)
        .bind(attachment.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_attachment(&self, workspace_id: Uuid, attachment_id: Uuid) -> StoreResult<Option<Attachment>> {
        let sql = format!(
            "SELECT {} FROM attachments WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL",
            ATTACHMENT_COLUMNS
        );
        let attachment = sqlx::query_as::<_, Attachment>(&sql)
            .bind(attachment_id)
            .bind(workspace_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(attachment)
    }

    async fn list_attachments(&self, target: AttachmentTarget) -> StoreResult<Vec<Attachment>> {
        let sql = format!(
            "SELECT {} FROM attachments WHERE target_kind = $1 AND target_id = $2 AND deleted_at IS NULL ORDER BY created_at",
            ATTACHMENT_COLUMNS
        );
        let attachments = sqlx::query_as::<_, Attachment>(&sql)
            .bind(target.kind())
            .bind(target.id())
            .fetch_all(&self.pool)
            .await?;
        Ok(attachments)
    }

    async fn target_project(&self, workspace_id: Uuid, target: AttachmentTarget) -> StoreResult<Option<Uuid>> {
        let sql = match target {
            AttachmentTarget::Project(_) => {
                "SELECT id FROM projects WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL"
            }
            AttachmentTarget::Task(_) => {
                "SELECT project_id FROM tasks WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL"
            }
            AttachmentTarget::Comment(_) => {
                r#"
                SELECT t.project_id FROM comments c
                JOIN tasks t ON t.id = c.task_id AND t.deleted_at IS NULL
                WHERE c.id = $1 AND c.workspace_id = $2 AND c.deleted_at IS NULL
                "#
            }
        };
        let project_id: Option<Uuid> = sqlx::query_scalar(sql)
            .bind(target.id())
            .bind(workspace_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project_id)
    }

    async fn insert_activity(&self, entry: &ActivityLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs
                (id, workspace_id, project_id, actor_id, action, subject_kind, subject_id, details, created_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.workspace_id)
        .bind(entry.project_id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(entry.subject.kind())
        .bind(entry.subject.id())
        .bind(&entry.details)
        .bind(entry.created_at)
        .bind(entry.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_activity(&self, workspace_id: Uuid, limit: i64) -> StoreResult<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, workspace_id, project_id, actor_id, action, subject_kind, subject_id, details, created_at, deleted_at
            FROM activity_logs
            WHERE workspace_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(workspace_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn soft_delete(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<u64> {
        if scope.is_empty() {
            return Ok(0);
        }
        let (clause, bind) = scope_filter(collection, scope)?;
        let sql = format!(
            "UPDATE {} SET deleted_at = $1 WHERE deleted_at IS NULL AND {}",
            table_name(collection),
            clause
        );

        let result = bind_scope(sqlx::query(&sql).bind(at), bind).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ids_deleted_at(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
        if scope.is_empty() {
            return Ok(vec![]);
        }
        let (clause, bind) = scope_filter(collection, scope)?;
        let sql = format!("SELECT id FROM {} WHERE deleted_at = $1 AND {}", table_name(collection), clause);

        let rows: Vec<PgRow> = bind_scope(sqlx::query(&sql).bind(at), bind).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("id").map_err(StoreError::from))
            .collect()
    }
}
