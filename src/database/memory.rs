use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    ActivityLog, Attachment, AttachmentTarget, Comment, Label, Membership, Project, Role, Task, User, Workspace,
};
use crate::database::store::{Collection, Constraint, IdentityStore, Scope, Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    workspaces: HashMap<Uuid, Workspace>,
    memberships: HashMap<Uuid, Membership>,
    labels: HashMap<Uuid, Label>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
    comments: HashMap<Uuid, Comment>,
    attachments: HashMap<Uuid, Attachment>,
    activity: HashMap<Uuid, ActivityLog>,
}

/// In-process store with the same uniqueness rules as the Postgres schema.
/// Each write holds the table lock, so a check-then-insert is atomic here the
/// way a unique index makes it atomic in Postgres.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The columns a soft-delete scope can filter on
struct RowKeys {
    id: Uuid,
    workspace_id: Option<Uuid>,
    project_id: Option<Uuid>,
    task_id: Option<Uuid>,
    target: Option<AttachmentTarget>,
}

impl RowKeys {
    fn matches(&self, scope: &Scope) -> bool {
        match scope {
            Scope::Ids(ids) => ids.contains(&self.id),
            Scope::Workspace(id) => self.workspace_id == Some(*id),
            Scope::Projects(ids) => self.project_id.map_or(false, |p| ids.contains(&p)),
            Scope::Tasks(ids) => self.task_id.map_or(false, |t| ids.contains(&t)),
            Scope::Targets(targets) => self.target.map_or(false, |t| targets.contains(&t)),
        }
    }
}

trait SoftDeletable {
    fn keys(&self) -> RowKeys;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn deleted_at_mut(&mut self) -> &mut Option<DateTime<Utc>>;
}

macro_rules! soft_deletable {
    ($ty:ty, |$row:ident| $keys:expr) => {
        impl SoftDeletable for $ty {
            fn keys(&self) -> RowKeys {
                let $row = self;
                $keys
            }
            fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.deleted_at
            }
            fn deleted_at_mut(&mut self) -> &mut Option<DateTime<Utc>> {
                &mut self.deleted_at
            }
        }
    };
}

soft_deletable!(Workspace, |w| RowKeys { id: w.id, workspace_id: None, project_id: None, task_id: None, target: None });
soft_deletable!(Membership, |m| RowKeys {
    id: m.id,
    workspace_id: Some(m.workspace_id),
    project_id: None,
    task_id: None,
    target: None
});
soft_deletable!(Label, |l| RowKeys {
    id: l.id,
    workspace_id: Some(l.workspace_id),
    project_id: None,
    task_id: None,
    target: None
});
soft_deletable!(Project, |p| RowKeys {
    id: p.id,
    workspace_id: Some(p.workspace_id),
    project_id: None,
    task_id: None,
    target: None
});
soft_deletable!(Task, |t| RowKeys {
    id: t.id,
    workspace_id: Some(t.workspace_id),
    project_id: Some(t.project_id),
    task_id: None,
    target: None
});
soft_deletable!(Comment, |c| RowKeys {
    id: c.id,
    workspace_id: Some(c.workspace_id),
    project_id: None,
    task_id: Some(c.task_id),
    target: None
});
soft_deletable!(Attachment, |a| RowKeys {
    id: a.id,
    workspace_id: Some(a.workspace_id),
    project_id: Some(a.project_id),
    task_id: None,
    target: Some(a.target)
});
soft_deletable!(ActivityLog, |a| RowKeys {
    id: a.id,
    workspace_id: Some(a.workspace_id),
    project_id: a.project_id,
    task_id: None,
    target: None
});

fn mark<T: SoftDeletable>(rows: &mut HashMap<Uuid, T>, scope: &Scope, at: DateTime<Utc>) -> u64 {
    let mut touched = 0;
    for row in rows.values_mut() {
        if row.deleted_at().is_none() && row.keys().matches(scope) {
            *row.deleted_at_mut() = Some(at);
            touched += 1;
        }
    }
    touched
}

fn deleted_ids<T: SoftDeletable>(rows: &HashMap<Uuid, T>, scope: &Scope, at: DateTime<Utc>) -> Vec<Uuid> {
    rows.values()
        .filter(|row| row.deleted_at() == Some(at))
        .map(|row| row.keys())
        .filter(|keys| keys.matches(scope))
        .map(|keys| keys.id)
        .collect()
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let email = user.email.to_lowercase();
        if tables.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict(Constraint::UserEmail));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let clash = workspace.deleted_at.is_none()
            && tables
                .workspaces
                .values()
                .any(|w| w.deleted_at.is_none() && w.slug == workspace.slug);
        if clash {
            return Err(StoreError::Conflict(Constraint::WorkspaceSlug));
        }
        tables.workspaces.insert(workspace.id, workspace.clone());
        Ok(())
    }

    async fn find_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>> {
        let tables = self.tables.read().await;
        Ok(tables.workspaces.get(&id).filter(|w| w.deleted_at.is_none()).cloned())
    }

    async fn workspace_slug_in_use(&self, slug: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.workspaces.values().any(|w| w.deleted_at.is_none() && w.slug == slug))
    }

    async fn update_workspace(&self, workspace: &Workspace) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.workspaces.get_mut(&workspace.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.name = workspace.name.clone();
                existing.description = workspace.description.clone();
                existing.settings = workspace.settings.clone();
                existing.updated_at = workspace.updated_at;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("workspace {}", workspace.id))),
        }
    }

    async fn list_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let tables = self.tables.read().await;
        let mut workspaces: Vec<Workspace> =
            tables.workspaces.values().filter(|w| w.deleted_at.is_none()).cloned().collect();
        workspaces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workspaces)
    }

    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<(Workspace, Role)>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<(Workspace, Role)> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id && m.deleted_at.is_none())
            .filter_map(|m| {
                tables
                    .workspaces
                    .get(&m.workspace_id)
                    .filter(|w| w.deleted_at.is_none())
                    .map(|w| (w.clone(), m.role))
            })
            .collect();
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        Ok(rows)
    }

    async fn list_deleted_workspaces(&self) -> StoreResult<Vec<Workspace>> {
        let tables = self.tables.read().await;
        let mut workspaces: Vec<Workspace> =
            tables.workspaces.values().filter(|w| w.deleted_at.is_some()).cloned().collect();
        workspaces.sort_by_key(|w| w.deleted_at);
        Ok(workspaces)
    }

    async fn insert_membership(&self, membership: &Membership) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let clash = membership.deleted_at.is_none()
            && tables.memberships.values().any(|m| {
                m.deleted_at.is_none() && m.workspace_id == membership.workspace_id && m.user_id == membership.user_id
            });
        if clash {
            return Err(StoreError::Conflict(Constraint::Membership));
        }
        let second_owner = membership.deleted_at.is_none()
            && membership.role == Role::Owner
            && tables.memberships.values().any(|m| {
                m.deleted_at.is_none() && m.workspace_id == membership.workspace_id && m.role == Role::Owner
            });
        if second_owner {
            return Err(StoreError::Conflict(Constraint::WorkspaceOwner));
        }
        tables.memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn find_membership(&self, workspace_id: Uuid, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .find(|m| m.deleted_at.is_none() && m.workspace_id == workspace_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_memberships(&self, workspace_id: Uuid) -> StoreResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        let mut memberships: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|m| m.deleted_at.is_none() && m.workspace_id == workspace_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|m| m.joined_at);
        Ok(memberships)
    }

    async fn update_membership_role(&self, membership_id: Uuid, expected: Role, role: Role) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.memberships.get_mut(&membership_id) {
            Some(m) if m.deleted_at.is_none() && m.role == expected => {
                m.role = role;
                Ok(())
            }
            _ => Err(StoreError::Stale(format!("membership {}", membership_id))),
        }
    }

    async fn end_membership(&self, membership_id: Uuid, expected: Role, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.memberships.get_mut(&membership_id) {
            Some(m) if m.deleted_at.is_none() && m.role == expected => {
                m.deleted_at = Some(at);
                Ok(())
            }
            _ => Err(StoreError::Stale(format!("membership {}", membership_id))),
        }
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .projects
            .values()
            .any(|p| p.workspace_id == project.workspace_id && p.key == project.key)
        {
            return Err(StoreError::Conflict(Constraint::ProjectKey));
        }
        tables.projects.insert(project.id, project.clone());
        Ok(())
    }

    async fn find_project(&self, workspace_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .get(&project_id)
            .filter(|p| p.deleted_at.is_none() && p.workspace_id == workspace_id)
            .cloned())
    }

    async fn project_key_in_use(&self, workspace_id: Uuid, key: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.projects.values().any(|p| p.workspace_id == workspace_id && p.key == key))
    }

    async fn list_projects(&self, workspace_id: Uuid) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.deleted_at.is_none() && p.workspace_id == workspace_id)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.projects.get_mut(&project.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.name = project.name.clone();
                existing.description = project.description.clone();
                existing.status = project.status;
                existing.start_date = project.start_date;
                existing.end_date = project.end_date;
                existing.updated_at = project.updated_at;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("project {}", project.id))),
        }
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let clash = task.deleted_at.is_none()
            && tables.tasks.values().any(|t| {
                t.deleted_at.is_none() && t.project_id == task.project_id && t.ticket_number == task.ticket_number
            });
        if clash {
            return Err(StoreError::Conflict(Constraint::TicketNumber));
        }
        tables.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_task(&self, project_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&task_id)
            .filter(|t| t.deleted_at.is_none() && t.project_id == project_id)
            .cloned())
    }

    async fn max_ticket_number(&self, project_id: Uuid) -> StoreResult<Option<i32>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.deleted_at.is_none() && t.project_id == project_id)
            .map(|t| t.ticket_number)
            .max())
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.deleted_at.is_none() && t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.ticket_number);
        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&task.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.title = task.title.clone();
                existing.description = task.description.clone();
                existing.status = task.status;
                existing.priority = task.priority;
                existing.assignee_ids = task.assignee_ids.clone();
                existing.label_ids = task.label_ids.clone();
                existing.due_date = task.due_date;
                existing.updated_at = task.updated_at;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("task {}", task.id))),
        }
    }

    async fn insert_label(&self, label: &Label) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let name = label.name.to_lowercase();
        let clash = label.deleted_at.is_none()
            && tables.labels.values().any(|l| {
                l.deleted_at.is_none() && l.workspace_id == label.workspace_id && l.name.to_lowercase() == name
            });
        if clash {
            return Err(StoreError::Conflict(Constraint::LabelName));
        }
        tables.labels.insert(label.id, label.clone());
        Ok(())
    }

    async fn list_labels(&self, workspace_id: Uuid) -> StoreResult<Vec<Label>> {
        let tables = self.tables.read().await;
        let mut labels: Vec<Label> = tables
            .labels
            .values()
            .filter(|l| l.deleted_at.is_none() && l.workspace_id == workspace_id)
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.tables.write().await.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_comment(&self, task_id: Uuid, comment_id: Uuid) -> StoreResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.deleted_at.is_none() && c.task_id == task_id)
            .cloned())
    }

    async fn list_comments(&self, task_id: Uuid) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.deleted_at.is_none() && c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.body = comment.body.clone();
                existing.updated_at = comment.updated_at;
                Ok(())
            }
            _ => Err(StoreError::NotFound(format!("comment {}", comment.id))),
        }
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> StoreResult<()> {
        self.tables.write().await.attachments.insert(attachment.id, attachment.clone());
        Ok(())
    }

    async fn find_attachment(&self, workspace_id: Uuid, attachment_id: Uuid) -> StoreResult<Option<Attachment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attachments
            .get(&attachment_id)
            .filter(|a| a.deleted_at.is_none() && a.workspace_id == workspace_id)
            .cloned())
    }

    async fn list_attachments(&self, target: AttachmentTarget) -> StoreResult<Vec<Attachment>> {
        let tables = self.tables.read().await;
        let mut attachments: Vec<Attachment> = tables
            .attachments
            .values()
            .filter(|a| a.deleted_at.is_none() && a.target == target)
            .cloned()
            .collect();
        attachments.sort_by_key(|a| a.created_at);
        Ok(attachments)
    }

    async fn target_project(&self, workspace_id: Uuid, target: AttachmentTarget) -> StoreResult<Option<Uuid>> {
        let tables = self.tables.read().await;
        let live_task = |id: Uuid| {
            tables
                .tasks
                .get(&id)
                .filter(|t| t.deleted_at.is_none() && t.workspace_id == workspace_id)
        };
        let project_id = match target {
            AttachmentTarget::Project(id) => tables
                .projects
                .get(&id)
                .filter(|p| p.deleted_at.is_none() && p.workspace_id == workspace_id)
                .map(|p| p.id),
            AttachmentTarget::Task(id) => live_task(id).map(|t| t.project_id),
            AttachmentTarget::Comment(id) => tables
                .comments
                .get(&id)
                .filter(|c| c.deleted_at.is_none() && c.workspace_id == workspace_id)
                .and_then(|c| live_task(c.task_id))
                .map(|t| t.project_id),
        };
        Ok(project_id)
    }

    async fn insert_activity(&self, entry: &ActivityLog) -> StoreResult<()> {
        self.tables.write().await.activity.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn list_activity(&self, workspace_id: Uuid, limit: i64) -> StoreResult<Vec<ActivityLog>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<ActivityLog> = tables
            .activity
            .values()
            .filter(|a| a.deleted_at.is_none() && a.workspace_id == workspace_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn soft_delete(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<u64> {
        if !collection.supports(&scope) {
            return Err(StoreError::UnsupportedScope { collection, scope: scope.name() });
        }
        let mut tables = self.tables.write().await;
        let touched = match collection {
            Collection::Workspaces => mark(&mut tables.workspaces, &scope, at),
            Collection::Memberships => mark(&mut tables.memberships, &scope, at),
            Collection::Labels => mark(&mut tables.labels, &scope, at),
            Collection::Projects => mark(&mut tables.projects, &scope, at),
            Collection::Tasks => mark(&mut tables.tasks, &scope, at),
            Collection::Comments => mark(&mut tables.comments, &scope, at),
            Collection::Attachments => mark(&mut tables.attachments, &scope, at),
            Collection::ActivityLogs => mark(&mut tables.activity, &scope, at),
        };
        Ok(touched)
    }

    async fn ids_deleted_at(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
        if !collection.supports(&scope) {
            return Err(StoreError::UnsupportedScope { collection, scope: scope.name() });
        }
        let tables = self.tables.read().await;
        let ids = match collection {
            Collection::Workspaces => deleted_ids(&tables.workspaces, &scope, at),
            Collection::Memberships => deleted_ids(&tables.memberships, &scope, at),
            Collection::Labels => deleted_ids(&tables.labels, &scope, at),
            Collection::Projects => deleted_ids(&tables.projects, &scope, at),
            Collection::Tasks => deleted_ids(&tables.tasks, &scope, at),
            Collection::Comments => deleted_ids(&tables.comments, &scope, at),
            Collection::Attachments => deleted_ids(&tables.attachments, &scope, at),
            Collection::ActivityLogs => deleted_ids(&tables.activity, &scope, at),
        };
        Ok(ids)
    }
}
