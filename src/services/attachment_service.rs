use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{ActivitySubject, Attachment, AttachmentTarget};
use crate::database::store::{Collection, Scope};
use crate::services::workspace_service::required;
use crate::services::{activity, Action, ServiceContext, ServiceError, WorkspaceAccess};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachment {
    pub target: AttachmentTarget,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// Location in the external object store
    pub url: String,
}

pub struct AttachmentService {
    ctx: ServiceContext,
}

impl AttachmentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Record metadata for an uploaded file
    pub async fn create(&self, access: &WorkspaceAccess, input: CreateAttachment) -> Result<Attachment, ServiceError> {
        access.authorize(Action::UploadAttachment)?;
        let project_id = self.resolve_target(access, input.target).await?;
        let file_name = required(&input.file_name, "file_name")?;
        let url = required(&input.url, "url")?;
        if input.size_bytes < 0 {
            return Err(ServiceError::Validation("size_bytes cannot be negative".to_string()));
        }

        let attachment = Attachment {
            id: Uuid::new_v4(),
            workspace_id: access.workspace_id(),
            project_id,
            target: input.target,
            uploaded_by: access.actor.id,
            file_name,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            url,
            created_at: crate::database::now(),
            deleted_at: None,
        };
        self.ctx.store.insert_attachment(&attachment).await?;

        activity::record(
            self.ctx.store.as_ref(),
            attachment.workspace_id,
            Some(project_id),
            access.actor.id,
            "attachment.uploaded",
            ActivitySubject::Attachment(attachment.id),
            json!({ "file_name": attachment.file_name, "target": attachment.target }),
        )
        .await;
        Ok(attachment)
    }

    pub async fn list(&self, access: &WorkspaceAccess, target: AttachmentTarget) -> Result<Vec<Attachment>, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        self.resolve_target(access, target).await?;
        Ok(self.ctx.store.list_attachments(target).await?)
    }

    /// Uploader, OWNER or ADMIN
    pub async fn delete(&self, access: &WorkspaceAccess, attachment_id: Uuid) -> Result<(), ServiceError> {
        let attachment = self
            .ctx
            .store
            .find_attachment(access.workspace_id(), attachment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attachment"))?;
        access.authorize(Action::DeleteAttachment {
            is_author: attachment.uploaded_by == access.actor.id,
        })?;

        self.ctx
            .store
            .soft_delete(
                Collection::Attachments,
                Scope::Ids(vec![attachment.id]),
                crate::database::now(),
            )
            .await?;
        activity::record(
            self.ctx.store.as_ref(),
            attachment.workspace_id,
            Some(attachment.project_id),
            access.actor.id,
            "attachment.deleted",
            ActivitySubject::Attachment(attachment.id),
            json!({ "file_name": attachment.file_name }),
        )
        .await;
        Ok(())
    }

    async fn resolve_target(&self, access: &WorkspaceAccess, target: AttachmentTarget) -> Result<Uuid, ServiceError> {
        self.ctx
            .store
            .target_project(access.workspace_id(), target)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", target.kind().to_lowercase(), target.id())))
    }
}
