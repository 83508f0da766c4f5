// Cascading soft-delete.
//
// Every cascade captures one instant and stamps it on the root and on every
// dependent that was still live, so rows removed together share a
// `deleted_at`. The batches are separate writes, not one transaction;
// `reconcile` re-applies workspace cascades to repair a run that stopped
// part way.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::AttachmentTarget;
use crate::database::store::{Collection, Scope, Store, StoreResult};

/// Outcome of one cascade: the shared timestamp and rows newly marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub deleted_at: DateTime<Utc>,
    pub rows: u64,
}

#[derive(Clone)]
pub struct CascadeOrchestrator {
    store: Arc<dyn Store>,
}

impl CascadeOrchestrator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Delete a workspace and everything scoped to it
    pub async fn delete_workspace(&self, workspace_id: Uuid) -> StoreResult<CascadeReport> {
        let at = crate::database::now();
        let root = self.mark(Collection::Workspaces, Scope::Ids(vec![workspace_id]), at).await?;
        let rows = self.workspace_dependents(workspace_id, at).await?;

        tracing::info!("Workspace {} deleted at {} ({} dependent rows)", workspace_id, at, rows);
        Ok(CascadeReport { deleted_at: at, rows: root + rows })
    }

    /// Delete a project with its tasks, their comments, attachments and activity
    pub async fn delete_project(&self, project_id: Uuid) -> StoreResult<CascadeReport> {
        let at = crate::database::now();
        let root = self.mark(Collection::Projects, Scope::Ids(vec![project_id]), at).await?;
        let rows = self.project_dependents(vec![project_id], at).await?;

        tracing::info!("Project {} deleted at {} ({} dependent rows)", project_id, at, rows);
        Ok(CascadeReport { deleted_at: at, rows: root + rows })
    }

    /// Delete a task, its comments, and attachments on either
    pub async fn delete_task(&self, task_id: Uuid) -> StoreResult<CascadeReport> {
        let at = crate::database::now();
        let mut rows = self.mark(Collection::Tasks, Scope::Ids(vec![task_id]), at).await?;
        rows += self.mark(Collection::Comments, Scope::Tasks(vec![task_id]), at).await?;

        let comment_ids = self
            .store
            .ids_deleted_at(Collection::Comments, Scope::Tasks(vec![task_id]), at)
            .await?;
        let mut targets = vec![AttachmentTarget::Task(task_id)];
        targets.extend(comment_ids.into_iter().map(AttachmentTarget::Comment));
        rows += self.mark(Collection::Attachments, Scope::Targets(targets), at).await?;

        tracing::debug!("Task {} deleted at {} ({} rows)", task_id, at, rows);
        Ok(CascadeReport { deleted_at: at, rows })
    }

    /// Delete a comment and its attachments
    pub async fn delete_comment(&self, comment_id: Uuid) -> StoreResult<CascadeReport> {
        let at = crate::database::now();
        let mut rows = self.mark(Collection::Comments, Scope::Ids(vec![comment_id]), at).await?;
        rows += self
            .mark(
                Collection::Attachments,
                Scope::Targets(vec![AttachmentTarget::Comment(comment_id)]),
                at,
            )
            .await?;

        Ok(CascadeReport { deleted_at: at, rows })
    }

    /// Re-run the dependent phase for every deleted workspace using its own
    /// timestamp. Only still-live rows are touched, so repeated runs are no-ops.
    pub async fn reconcile(&self) -> StoreResult<u64> {
        let mut repaired = 0;
        for workspace in self.store.list_deleted_workspaces().await? {
            let Some(at) = workspace.deleted_at else { continue };
            let rows = self.workspace_dependents(workspace.id, at).await?;
            if rows > 0 {
                tracing::warn!(
                    "Reconciled workspace {} ({}): {} dependents were still live",
                    workspace.id,
                    workspace.slug,
                    rows
                );
            }
            repaired += rows;
        }
        Ok(repaired)
    }

    async fn workspace_dependents(&self, workspace_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let scope = || Scope::Workspace(workspace_id);

        // Disjoint collections, safe to run together
        let (memberships, labels, projects, activity) = futures::try_join!(
            self.mark(Collection::Memberships, scope(), at),
            self.mark(Collection::Labels, scope(), at),
            self.mark(Collection::Projects, scope(), at),
            self.mark(Collection::ActivityLogs, scope(), at),
        )?;

        let project_ids = self.store.ids_deleted_at(Collection::Projects, scope(), at).await?;
        let mut rows = memberships + labels + projects + activity;

        if !project_ids.is_empty() {
            let scope = Scope::Projects(project_ids);
            rows += self.mark(Collection::Tasks, scope.clone(), at).await?;
            let task_ids = self.store.ids_deleted_at(Collection::Tasks, scope, at).await?;
            if !task_ids.is_empty() {
                rows += self.mark(Collection::Comments, Scope::Tasks(task_ids), at).await?;
            }
        }

        rows += self.mark(Collection::Attachments, scope(), at).await?;
        Ok(rows)
    }

    async fn project_dependents(&self, project_ids: Vec<Uuid>, at: DateTime<Utc>) -> StoreResult<u64> {
        let scope = Scope::Projects(project_ids);
        let mut rows = self.mark(Collection::Tasks, scope.clone(), at).await?;

        let task_ids = self.store.ids_deleted_at(Collection::Tasks, scope.clone(), at).await?;
        if !task_ids.is_empty() {
            rows += self.mark(Collection::Comments, Scope::Tasks(task_ids), at).await?;
        }

        let (attachments, activity) = futures::try_join!(
            self.mark(Collection::Attachments, scope.clone(), at),
            self.mark(Collection::ActivityLogs, scope, at),
        )?;
        Ok(rows + attachments + activity)
    }

    async fn mark(&self, collection: Collection, scope: Scope, at: DateTime<Utc>) -> StoreResult<u64> {
        if scope.is_empty() {
            return Ok(0);
        }
        self.store.soft_delete(collection, scope, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::*;
    use crate::database::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        workspace: Workspace,
        project: Project,
        task: Task,
        comment: Comment,
        attachment: Attachment,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let now = crate::database::now();
        let owner = Uuid::new_v4();

        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            slug: "acme".into(),
            description: None,
            owner_id: owner,
            settings: WorkspaceSettings::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.insert_workspace(&workspace).await.unwrap();
        store
            .insert_membership(&Membership::new(workspace.id, owner, Role::Owner, None))
            .await
            .unwrap();
        store.insert_label(&Label::new(workspace.id, "Bug", "#d73a4a")).await.unwrap();

        let project = Project {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            name: "Mobile".into(),
            key: "MOB".into(),
            description: None,
            owner_id: owner,
            status: ProjectStatus::Active,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.insert_project(&project).await.unwrap();

        let task = Task {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            project_id: project.id,
            ticket_number: 1,
            title: "Crash on launch".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::High,
            reporter_id: owner,
            assignee_ids: vec![],
            label_ids: vec![],
            due_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.insert_task(&task).await.unwrap();

        let comment = Comment {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            task_id: task.id,
            author_id: owner,
            body: "repro attached".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.insert_comment(&comment).await.unwrap();

        let attachment = Attachment {
            id: Uuid::new_v4(),
            workspace_id: workspace.id,
            project_id: project.id,
            target: AttachmentTarget::Comment(comment.id),
            uploaded_by: owner,
            file_name: "trace.log".into(),
            mime_type: "text/plain".into(),
            size_bytes: 42,
            url: "https://files.example.com/trace.log".into(),
            created_at: now,
            deleted_at: None,
        };
        store.insert_attachment(&attachment).await.unwrap();

        store
            .insert_activity(&ActivityLog::new(
                workspace.id,
                Some(project.id),
                owner,
                "task.created",
                ActivitySubject::Task(task.id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        Fixture {
            store,
            workspace,
            project,
            task,
            comment,
            attachment,
        }
    }

    #[tokio::test]
    async fn workspace_cascade_stamps_every_dependent_with_one_instant() {
        let f = fixture().await;
        let cascade = CascadeOrchestrator::new(f.store.clone());

        let report = cascade.delete_workspace(f.workspace.id).await.unwrap();
        let at = report.deleted_at;

        for (collection, scope) in [
            (Collection::Workspaces, Scope::Ids(vec![f.workspace.id])),
            (Collection::Memberships, Scope::Workspace(f.workspace.id)),
            (Collection::Labels, Scope::Workspace(f.workspace.id)),
            (Collection::Projects, Scope::Ids(vec![f.project.id])),
            (Collection::Tasks, Scope::Ids(vec![f.task.id])),
            (Collection::Comments, Scope::Ids(vec![f.comment.id])),
            (Collection::Attachments, Scope::Ids(vec![f.attachment.id])),
            (Collection::ActivityLogs, Scope::Workspace(f.workspace.id)),
        ] {
            let ids = f.store.ids_deleted_at(collection, scope, at).await.unwrap();
            assert_eq!(ids.len(), 1, "{:?} not stamped with the cascade instant", collection);
        }
        // workspace, membership, label, project, task, comment, attachment, activity
        assert_eq!(report.rows, 8);
        assert!(f.store.find_workspace(f.workspace.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn earlier_deletions_keep_their_own_timestamp() {
        let f = fixture().await;
        let cascade = CascadeOrchestrator::new(f.store.clone());

        let first = cascade.delete_comment(f.comment.id).await.unwrap();
        let second = cascade.delete_workspace(f.workspace.id).await.unwrap();
        assert!(second.deleted_at >= first.deleted_at);

        let stamped = f
            .store
            .ids_deleted_at(Collection::Comments, Scope::Ids(vec![f.comment.id]), first.deleted_at)
            .await
            .unwrap();
        assert_eq!(stamped, vec![f.comment.id]);
    }

    #[tokio::test]
    async fn task_cascade_reaches_comment_attachments() {
        let f = fixture().await;
        let cascade = CascadeOrchestrator::new(f.store.clone());

        let report = cascade.delete_task(f.task.id).await.unwrap();
        assert_eq!(report.rows, 3);
        assert!(f.store.find_attachment(f.workspace.id, f.attachment.id).await.unwrap().is_none());
        assert!(f.store.find_project(f.workspace.id, f.project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn project_cascade_leaves_workspace_rows_alone() {
        let f = fixture().await;
        let cascade = CascadeOrchestrator::new(f.store.clone());

        cascade.delete_project(f.project.id).await.unwrap();
        assert!(f.store.find_task(f.project.id, f.task.id).await.unwrap().is_none());
        assert!(f.store.find_comment(f.task.id, f.comment.id).await.unwrap().is_none());
        assert_eq!(f.store.list_labels(f.workspace.id).await.unwrap().len(), 1);
        assert!(f.store.find_workspace(f.workspace.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reconcile_finishes_an_interrupted_cascade() {
        let f = fixture().await;
        let cascade = CascadeOrchestrator::new(f.store.clone());

        // Root marked, dependents never reached
        let at = crate::database::now();
        f.store
            .soft_delete(Collection::Workspaces, Scope::Ids(vec![f.workspace.id]), at)
            .await
            .unwrap();
        assert!(f.store.find_project(f.workspace.id, f.project.id).await.unwrap().is_some());

        assert_eq!(cascade.reconcile().await.unwrap(), 7);
        let tasks = f
            .store
            .ids_deleted_at(Collection::Tasks, Scope::Ids(vec![f.task.id]), at)
            .await
            .unwrap();
        assert_eq!(tasks, vec![f.task.id]);

        assert_eq!(cascade.reconcile().await.unwrap(), 0);
    }
}
