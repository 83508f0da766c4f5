use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{ActivitySubject, Project, ProjectStatus};
use crate::services::identifiers::claim_project_key;
use crate::services::workspace_service::required;
use crate::services::{activity, Action, ServiceContext, ServiceError, WorkspaceAccess};

const MAX_KEY_LEN: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    /// Used verbatim (uppercased) when present; a taken key is a conflict
    pub key: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub struct ProjectService {
    ctx: ServiceContext,
}

impl ProjectService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, access: &WorkspaceAccess, input: CreateProject) -> Result<Project, ServiceError> {
        access.authorize(Action::CreateProject)?;
        let name = required(&input.name, "name")?;
        check_dates(input.start_date, input.end_date)?;

        let now = crate::database::now();
        let mut project = Project {
            id: Uuid::new_v4(),
            workspace_id: access.workspace_id(),
            name,
            key: String::new(),
            description: input.description,
            owner_id: access.actor.id,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match input.key {
            Some(key) => {
                project.key = normalize_key(&key)?;
                self.ctx.store.insert_project(&project).await?;
            }
            None => self.insert_with_generated_key(&mut project).await?,
        }

        activity::record(
            self.ctx.store.as_ref(),
            project.workspace_id,
            Some(project.id),
            access.actor.id,
            "project.created",
            ActivitySubject::Project(project.id),
            json!({ "name": project.name, "key": project.key }),
        )
        .await;
        Ok(project)
    }

    async fn insert_with_generated_key(&self, project: &mut Project) -> Result<(), ServiceError> {
        let store = self.ctx.store.as_ref();
        let draft = project.clone();
        project.key = claim_project_key(store, draft.workspace_id, &draft.name, &self.ctx.generation, |key| {
            let candidate = Project { key, ..draft.clone() };
            async move { store.insert_project(&candidate).await }
        })
        .await?;
        Ok(())
    }

    pub async fn get(&self, access: &WorkspaceAccess, project_id: Uuid) -> Result<Project, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        self.load(access, project_id).await
    }

    pub async fn list(&self, access: &WorkspaceAccess) -> Result<Vec<Project>, ServiceError> {
        access.authorize(Action::ViewWorkspace)?;
        Ok(self.ctx.store.list_projects(access.workspace_id()).await?)
    }

    pub async fn update(
        &self,
        access: &WorkspaceAccess,
        project_id: Uuid,
        input: UpdateProject,
    ) -> Result<Project, ServiceError> {
        access.authorize(Action::UpdateProject)?;
        let mut project = self.load(access, project_id).await?;

        if let Some(name) = input.name {
            project.name = required(&name, "name")?;
        }
        if let Some(description) = input.description {
            project.description = Some(description);
        }
        if let Some(status) = input.status {
            project.status = status;
        }
        if input.start_date.is_some() {
            project.start_date = input.start_date;
        }
        if input.end_date.is_some() {
            project.end_date = input.end_date;
        }
        check_dates(project.start_date, project.end_date)?;
        project.updated_at = crate::database::now();

        self.ctx.store.update_project(&project).await?;
        activity::record(
            self.ctx.store.as_ref(),
            project.workspace_id,
            Some(project.id),
            access.actor.id,
            "project.updated",
            ActivitySubject::Project(project.id),
            json!({ "name": project.name, "status": project.status }),
        )
        .await;
        Ok(project)
    }

    pub async fn delete(&self, access: &WorkspaceAccess, project_id: Uuid) -> Result<(), ServiceError> {
        access.authorize(Action::DeleteProject)?;
        let project = self.load(access, project_id).await?;
        self.ctx.cascade().delete_project(project.id).await?;

        activity::record(
            self.ctx.store.as_ref(),
            project.workspace_id,
            None,
            access.actor.id,
            "project.deleted",
            ActivitySubject::Project(project.id),
            json!({ "key": project.key }),
        )
        .await;
        Ok(())
    }

    /// Live project in the caller's workspace, without a role check
    pub(crate) async fn load(&self, access: &WorkspaceAccess, project_id: Uuid) -> Result<Project, ServiceError> {
        self.ctx
            .store
            .find_project(access.workspace_id(), project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Project"))
    }
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ServiceError::Validation(
            "end_date cannot be before start_date".to_string(),
        )),
        _ => Ok(()),
    }
}

fn normalize_key(key: &str) -> Result<String, ServiceError> {
    let key = key.trim().to_uppercase();
    if key.is_empty() || key.len() > MAX_KEY_LEN || !key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(ServiceError::Validation(format!(
            "Invalid project key '{}': use 1 to {} letters or digits",
            key, MAX_KEY_LEN
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_date_may_not_precede_start_date() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        assert!(check_dates(d("2024-01-01"), d("2024-01-01")).is_ok());
        assert!(check_dates(d("2024-01-02"), d("2024-01-01")).is_err());
        assert!(check_dates(None, d("2024-01-01")).is_ok());
    }

    #[test]
    fn explicit_keys_are_uppercased_and_checked() {
        assert_eq!(normalize_key(" mob ").unwrap(), "MOB");
        assert!(normalize_key("MO-B").is_err());
        assert!(normalize_key("").is_err());
        assert!(normalize_key("ABCDEFGHIJK").is_err());
    }
}
