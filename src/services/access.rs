// Per-request gate: the token subject becomes an `Actor` only while the
// identity store still holds it as active, then workspace-scoped requests
// resolve the workspace and the caller's membership and hand the pair to the
// role predicates in `policy`.

use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Membership, Role, Workspace};
use crate::database::store::{IdentityStore, Store};
use crate::services::policy::{self, Action};
use crate::services::ServiceError;

/// Authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub is_super_admin: bool,
}

impl Actor {
    /// Platform-level check, independent of any workspace membership
    pub fn require_super_admin(&self) -> Result<(), ServiceError> {
        if self.is_super_admin {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Super admin access required".to_string()))
        }
    }
}

/// Re-read the token subject; a missing or deactivated user is Unauthenticated
pub async fn authenticate_user(identity: &dyn IdentityStore, user_id: Uuid) -> Result<Actor, ServiceError> {
    match identity.find_user_by_id(user_id).await? {
        Some(user) if user.is_active => Ok(Actor {
            id: user.id,
            email: user.email,
            is_super_admin: user.is_super_admin,
        }),
        _ => {
            tracing::warn!("Rejected token for missing or inactive user {}", user_id);
            Err(ServiceError::Unauthenticated("User not found or inactive".to_string()))
        }
    }
}

/// A caller's resolved standing in one live workspace
#[derive(Debug, Clone)]
pub struct WorkspaceAccess {
    pub actor: Actor,
    pub workspace: Workspace,
    pub membership: Membership,
}

impl WorkspaceAccess {
    pub fn role(&self) -> Role {
        self.membership.role
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace.id
    }

    pub fn authorize(&self, action: Action) -> Result<(), ServiceError> {
        policy::authorize(self.role(), &self.workspace.settings, action)
    }
}

/// Missing or deleted workspace is NotFound; an existing workspace the caller
/// does not belong to is Forbidden. Read-only.
pub async fn resolve_access(store: &dyn Store, workspace_id: Uuid, actor: Actor) -> Result<WorkspaceAccess, ServiceError> {
    let workspace = store
        .find_workspace(workspace_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Workspace"))?;

    let membership = store
        .find_membership(workspace_id, actor.id)
        .await?
        .ok_or_else(|| ServiceError::Forbidden("You are not a member of this workspace".to_string()))?;

    Ok(WorkspaceAccess {
        actor,
        workspace,
        membership,
    })
}
