use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::database::models::{
    ActivityLog, ActivitySubject, Label, Membership, Role, Workspace, WorkspaceSettings,
};
use crate::database::models::label::DEFAULT_LABELS;
use crate::database::store::{Collection, Scope};
use crate::services::identifiers::{claim_workspace_slug, is_valid_slug};
use crate::services::notifier::{self, Notification};
use crate::services::{activity, Action, Actor, ServiceContext, ServiceError, WorkspaceAccess};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    /// Used verbatim when present; a taken slug is a conflict, not renamed
    pub slug: Option<String>,
    pub description: Option<String>,
    pub settings: Option<WorkspaceSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkspace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<WorkspaceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLabel {
    pub name: String,
    pub color: Option<String>,
}

/// A workspace as seen by one of its members
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSummary {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub role: Role,
}

const DEFAULT_LABEL_COLOR: &str = "#6b7280";
const ACTIVITY_PAGE_LIMIT: i64 = 50;

pub struct WorkspaceService {
    ctx: ServiceContext,
}

impl WorkspaceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a workspace owned by `actor`, with its OWNER membership and default labels
    pub async fn create(&self, actor: &Actor, input: CreateWorkspace) -> Result<WorkspaceSummary, ServiceError> {
        let name = required(&input.name, "name")?;
        let now = crate::database::now();
        let mut workspace = Workspace {
            id: uuid::Uuid::new_v4(),
            name,
            slug: String::new(),
            description: input.description,
            owner_id: actor.id,
            settings: input.settings.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match input.slug {
            Some(slug) => {
                if !is_valid_slug(&slug) {
                    return Err(ServiceError::Validation(format!(
                        "Invalid slug '{}': use lowercase letters, digits and single hyphens",
                        slug
                    )));
                }
                workspace.slug = slug;
                self.ctx.store.insert_workspace(&workspace).await?;
            }
            None => self.insert_with_generated_slug(&mut workspace).await?,
        }

        let membership = Membership::new(workspace.id, actor.id, Role::Owner, None);
        if let Err(e) = self.ctx.store.insert_membership(&membership).await {
            // Without an owner the workspace is unreachable; take it back out
            tracing::error!("Owner membership for workspace {} failed: {}", workspace.id, e);
            if let Err(undo) = self
                .ctx
                .store
                .soft_delete(Collection::Workspaces, Scope::Ids(vec![workspace.id]), crate::database::now())
                .await
            {
                tracing::error!("Could not roll back workspace {}: {}", workspace.id, undo);
            }
            return Err(e.into());
        }

        for (label_name, color) in DEFAULT_LABELS {
            if let Err(e) = self.ctx.store.insert_label(&Label::new(workspace.id, label_name, color)).await {
                tracing::warn!("Default label '{}' for workspace {} not created: {}", label_name, workspace.id, e);
            }
        }

        activity::record(
            self.ctx.store.as_ref(),
            workspace.id,
            None,
            actor.id,
            "workspace.created",
            ActivitySubject::Workspace(workspace.id),
            json!({ "name": workspace.name, "slug": workspace.slug }),
        )
        .await;

        notifier::dispatch(
            self.ctx.notifier.clone(),
            Notification::WorkspaceCreated {
                workspace_id: workspace.id,
                workspace_name: workspace.name.clone(),
                owner_email: actor.email.clone(),
            },
        );

        tracing::info!("Workspace '{}' ({}) created by {}", workspace.slug, workspace.id, actor.id);
        Ok(WorkspaceSummary {
            workspace,
            role: Role::Owner,
        })
    }

    async fn insert_with_generated_slug(&self, workspace: &mut Workspace) -> Result<(), ServiceError> {
        let store = self.ctx.store.as_ref();
        let draft = workspace.clone();
        workspace.slug = claim_workspace_slug(store, &draft.name, &self.ctx.generation, |slug| {
            let candidate = Workspace { slug, ..draft.clone() };
            async move { store.insert_workspace(&candidate).await }
        })
        .await?;
        Ok(())
    }

    pub fn get(&self, access: &WorkspaceAccess) -> Result<WorkspaceSummary, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        Ok(WorkspaceSummary {
            workspace: access.workspace.clone(),
            role: access.role(),
        })
    }

    /// Workspaces the caller belongs to
    pub async fn list_for_user(&self, actor: &Actor) -> Result<Vec<WorkspaceSummary>, ServiceError> {
        let rows = self.ctx.store.list_workspaces_for_user(actor.id).await?;
        Ok(rows
            .into_iter()
            .map(|(workspace, role)| WorkspaceSummary { workspace, role })
            .collect())
    }

    /// Every live workspace on the platform; super admins only
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Workspace>, ServiceError> {
        actor.require_super_admin()?;
        Ok(self.ctx.store.list_workspaces().await?)
    }

    /// Rename, describe or reconfigure. The slug never changes.
    pub async fn update(&self, access: &WorkspaceAccess, input: UpdateWorkspace) -> Result<Workspace, ServiceError> {
        access.authorize(Action::UpdateWorkspace)?;

        let mut workspace = access.workspace.clone();
        if let Some(name) = input.name {
            workspace.name = required(&name, "name")?;
        }
        if let Some(description) = input.description {
            workspace.description = Some(description);
        }
        if let Some(settings) = input.settings {
            workspace.settings = settings;
        }
        workspace.updated_at = crate::database::now();

        self.ctx.store.update_workspace(&workspace).await?;
        activity::record(
            self.ctx.store.as_ref(),
            workspace.id,
            None,
            access.actor.id,
            "workspace.updated",
            ActivitySubject::Workspace(workspace.id),
            json!({ "name": workspace.name }),
        )
        .await;
        Ok(workspace)
    }

    pub async fn delete(&self, access: &WorkspaceAccess) -> Result<(), ServiceError> {
        access.authorize(Action::DeleteWorkspace)?;
        self.ctx.cascade().delete_workspace(access.workspace_id()).await?;
        Ok(())
    }

    pub async fn list_labels(&self, access: &WorkspaceAccess) -> Result<Vec<Label>, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        Ok(self.ctx.store.list_labels(access.workspace_id()).await?)
    }

    pub async fn create_label(&self, access: &WorkspaceAccess, input: CreateLabel) -> Result<Label, ServiceError> {
        access.authorize(Action::ManageLabels)?;
        let name = required(&input.name, "name")?;
        let label = Label::new(
            access.workspace_id(),
            name,
            input.color.unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string()),
        );
        self.ctx.store.insert_label(&label).await?;
        Ok(label)
    }

    /// Newest first
    pub async fn list_activity(&self, access: &WorkspaceAccess) -> Result<Vec<ActivityLog>, ServiceError> {
        access.authorize(Action::ViewActivity)?;
        Ok(self
            .ctx
            .store
            .list_activity(access.workspace_id(), ACTIVITY_PAGE_LIMIT)
            .await?)
    }
}

/// Trimmed, non-empty text field
pub(crate) fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Validation(format!("Field '{}' is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}
