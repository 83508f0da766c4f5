use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

use crate::database::models::{ActivitySubject, Project, Task, TaskPriority, TaskStatus};
use crate::services::sequencer;
use crate::services::workspace_service::required;
use crate::services::{activity, Action, ServiceContext, ServiceError, WorkspaceAccess};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_ids: Option<Vec<Uuid>>,
    pub label_ids: Option<Vec<Uuid>>,
    pub due_date: Option<NaiveDate>,
}

/// A task with its display ticket id (`KEY-N`)
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub ticket_id: String,
}

impl TaskView {
    fn new(task: Task, project: &Project) -> Self {
        Self {
            ticket_id: task.ticket_id(&project.key),
            task,
        }
    }
}

pub struct TaskService {
    ctx: ServiceContext,
}

impl TaskService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        access: &WorkspaceAccess,
        project_id: Uuid,
        input: CreateTask,
    ) -> Result<TaskView, ServiceError> {
        access.authorize(Action::CreateTask)?;
        let project = self.ctx.projects().load(access, project_id).await?;
        let title = required(&input.title, "title")?;
        self.check_assignees(access, &input.assignee_ids).await?;
        self.check_labels(access, &input.label_ids).await?;

        let now = crate::database::now();
        let mut task = Task {
            id: Uuid::new_v4(),
            workspace_id: access.workspace_id(),
            project_id: project.id,
            ticket_number: 0,
            title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            reporter_id: access.actor.id,
            assignee_ids: dedup(input.assignee_ids),
            label_ids: dedup(input.label_ids),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        sequencer::insert_with_next_number(self.ctx.store.as_ref(), &mut task, self.ctx.generation.write_retries)
            .await?;

        let view = TaskView::new(task, &project);
        activity::record(
            self.ctx.store.as_ref(),
            view.task.workspace_id,
            Some(project.id),
            access.actor.id,
            "task.created",
            ActivitySubject::Task(view.task.id),
            json!({ "ticket_id": view.ticket_id, "title": view.task.title }),
        )
        .await;
        Ok(view)
    }

    pub async fn get(&self, access: &WorkspaceAccess, project_id: Uuid, task_id: Uuid) -> Result<TaskView, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        let project = self.ctx.projects().load(access, project_id).await?;
        let task = self.find(project.id, task_id).await?;
        Ok(TaskView::new(task, &project))
    }

    pub async fn list(&self, access: &WorkspaceAccess, project_id: Uuid) -> Result<Vec<TaskView>, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        let project = self.ctx.projects().load(access, project_id).await?;
        let tasks = self.ctx.store.list_tasks(project.id).await?;
        Ok(tasks.into_iter().map(|t| TaskView::new(t, &project)).collect())
    }

    pub async fn update(
        &self,
        access: &WorkspaceAccess,
        project_id: Uuid,
        task_id: Uuid,
        input: UpdateTask,
    ) -> Result<TaskView, ServiceError> {
        access.authorize(Action::UpdateTask)?;
        let project = self.ctx.projects().load(access, project_id).await?;
        let mut task = self.find(project.id, task_id).await?;

        if let Some(title) = input.title {
            task.title = required(&title, "title")?;
        }
        if let Some(description) = input.description {
            task.description = Some(description);
        }
        if let Some(status) = input.status {
            task.status = status;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(assignees) = input.assignee_ids {
            self.check_assignees(access, &assignees).await?;
            task.assignee_ids = dedup(assignees);
        }
        if let Some(labels) = input.label_ids {
            self.check_labels(access, &labels).await?;
            task.label_ids = dedup(labels);
        }
        if input.due_date.is_some() {
            task.due_date = input.due_date;
        }
        task.updated_at = crate::database::now();

        self.ctx.store.update_task(&task).await?;
        let view = TaskView::new(task, &project);
        activity::record(
            self.ctx.store.as_ref(),
            view.task.workspace_id,
            Some(project.id),
            access.actor.id,
            "task.updated",
            ActivitySubject::Task(view.task.id),
            json!({ "ticket_id": view.ticket_id, "status": view.task.status }),
        )
        .await;
        Ok(view)
    }

    pub async fn delete(&self, access: &WorkspaceAccess, project_id: Uuid, task_id: Uuid) -> Result<(), ServiceError> {
        access.authorize(Action::DeleteTask)?;
        let project = self.ctx.projects().load(access, project_id).await?;
        let task = self.find(project.id, task_id).await?;
        self.ctx.cascade().delete_task(task.id).await?;

        activity::record(
            self.ctx.store.as_ref(),
            task.workspace_id,
            Some(project.id),
            access.actor.id,
            "task.deleted",
            ActivitySubject::Task(task.id),
            json!({ "ticket_id": task.ticket_id(&project.key) }),
        )
        .await;
        Ok(())
    }

    /// Live task under a live project in the caller's workspace
    pub(crate) async fn load(&self, access: &WorkspaceAccess, project_id: Uuid, task_id: Uuid) -> Result<Task, ServiceError> {
        let project = self.ctx.projects().load(access, project_id).await?;
        self.find(project.id, task_id).await
    }

    async fn find(&self, project_id: Uuid, task_id: Uuid) -> Result<Task, ServiceError> {
        self.ctx
            .store
            .find_task(project_id, task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task"))
    }

    async fn check_assignees(&self, access: &WorkspaceAccess, assignees: &[Uuid]) -> Result<(), ServiceError> {
        for user_id in assignees {
            let member = self.ctx.store.find_membership(access.workspace_id(), *user_id).await?;
            let active = match member {
                Some(_) => self
                    .ctx
                    .identity
                    .find_user_by_id(*user_id)
                    .await?
                    .map_or(false, |u| u.is_active),
                None => false,
            };
            if !active {
                return Err(ServiceError::Validation(format!(
                    "Assignee {} is not an active member of this workspace",
                    user_id
                )));
            }
        }
        Ok(())
    }

    async fn check_labels(&self, access: &WorkspaceAccess, label_ids: &[Uuid]) -> Result<(), ServiceError> {
        if label_ids.is_empty() {
            return Ok(());
        }
        let known: HashSet<Uuid> = self
            .ctx
            .store
            .list_labels(access.workspace_id())
            .await?
            .into_iter()
            .map(|l| l.id)
            .collect();
        match label_ids.iter().find(|id| !known.contains(id)) {
            Some(id) => Err(ServiceError::Validation(format!("Label {} does not exist in this workspace", id))),
            None => Ok(()),
        }
    }
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
