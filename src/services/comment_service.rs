use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{ActivitySubject, Comment};
use crate::services::workspace_service::required;
use crate::services::{activity, Action, ServiceContext, ServiceError, WorkspaceAccess};

#[derive(Debug, Clone, Deserialize)]
pub struct CommentBody {
    pub body: String,
}

/// Path of a task inside the caller's workspace
#[derive(Debug, Clone, Copy)]
pub struct TaskRef {
    pub project_id: Uuid,
    pub task_id: Uuid,
}

pub struct CommentService {
    ctx: ServiceContext,
}

impl CommentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, access: &WorkspaceAccess, at: TaskRef, input: CommentBody) -> Result<Comment, ServiceError> {
        access.authorize(Action::CreateComment)?;
        let task = self.ctx.tasks().load(access, at.project_id, at.task_id).await?;
        let body = required(&input.body, "body")?;

        let now = crate::database::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            workspace_id: access.workspace_id(),
            task_id: task.id,
            author_id: access.actor.id,
            body,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.ctx.store.insert_comment(&comment).await?;

        activity::record(
            self.ctx.store.as_ref(),
            comment.workspace_id,
            Some(task.project_id),
            access.actor.id,
            "comment.created",
            ActivitySubject::Comment(comment.id),
            json!({ "task_id": task.id }),
        )
        .await;
        Ok(comment)
    }

    pub async fn list(&self, access: &WorkspaceAccess, at: TaskRef) -> Result<Vec<Comment>, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        let task = self.ctx.tasks().load(access, at.project_id, at.task_id).await?;
        Ok(self.ctx.store.list_comments(task.id).await?)
    }

    /// Only the author may edit
    pub async fn update(
        &self,
        access: &WorkspaceAccess,
        at: TaskRef,
        comment_id: Uuid,
        input: CommentBody,
    ) -> Result<Comment, ServiceError> {
        let mut comment = self.load(access, at, comment_id).await?;
        access.authorize(Action::EditComment {
            is_author: comment.author_id == access.actor.id,
        })?;

        comment.body = required(&input.body, "body")?;
        comment.updated_at = crate::database::now();
        self.ctx.store.update_comment(&comment).await?;
        Ok(comment)
    }

    /// Author, OWNER or ADMIN; attachments on the comment go with it
    pub async fn delete(&self, access: &WorkspaceAccess, at: TaskRef, comment_id: Uuid) -> Result<(), ServiceError> {
        let comment = self.load(access, at, comment_id).await?;
        access.authorize(Action::DeleteComment {
            is_author: comment.author_id == access.actor.id,
        })?;

        self.ctx.cascade().delete_comment(comment.id).await?;
        activity::record(
            self.ctx.store.as_ref(),
            comment.workspace_id,
            Some(at.project_id),
            access.actor.id,
            "comment.deleted",
            ActivitySubject::Comment(comment.id),
            json!({ "task_id": comment.task_id }),
        )
        .await;
        Ok(())
    }

    async fn load(&self, access: &WorkspaceAccess, at: TaskRef, comment_id: Uuid) -> Result<Comment, ServiceError> {
        let task = self.ctx.tasks().load(access, at.project_id, at.task_id).await?;
        self.ctx
            .store
            .find_comment(task.id, comment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))
    }
}
