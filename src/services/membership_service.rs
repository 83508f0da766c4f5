use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{ActivitySubject, Membership, Role};
use crate::services::notifier::{self, Notification};
use crate::services::policy;
use crate::services::{activity, Action, ServiceContext, ServiceError, WorkspaceAccess};

#[derive(Debug, Clone, Deserialize)]
pub struct InviteMember {
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: Role,
}

fn default_invite_role() -> Role {
    Role::Member
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRole {
    pub role: Role,
}

/// Membership joined with the member's identity
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    #[serde(flatten)]
    pub membership: Membership,
    pub email: Option<String>,
    pub name: Option<String>,
}

pub struct MembershipService {
    ctx: ServiceContext,
}

impl MembershipService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn list(&self, access: &WorkspaceAccess) -> Result<Vec<Member>, ServiceError> {
        access.authorize(Action::ListMembers)?;

        let memberships = self.ctx.store.list_memberships(access.workspace_id()).await?;
        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let user = self.ctx.identity.find_user_by_id(membership.user_id).await?;
            members.push(Member {
                email: user.as_ref().map(|u| u.email.clone()),
                name: user.map(|u| u.name),
                membership,
            });
        }
        Ok(members)
    }

    /// Add an existing, active user to the workspace
    pub async fn invite(&self, access: &WorkspaceAccess, input: InviteMember) -> Result<Membership, ServiceError> {
        access.authorize(Action::InviteMember)?;
        policy::check_invite(access.role(), input.role)?;

        let email = input.email.trim().to_lowercase();
        let user = self
            .ctx
            .identity
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No user with email {}", email)))?;
        if !user.is_active {
            return Err(ServiceError::Validation(format!("User {} is not active", email)));
        }

        if self.ctx.store.find_membership(access.workspace_id(), user.id).await?.is_some() {
            return Err(ServiceError::Conflict("User is already a member of this workspace".to_string()));
        }

        let membership = Membership::new(access.workspace_id(), user.id, input.role, Some(access.actor.id));
        // A concurrent invite can still lose on the unique index
        self.ctx.store.insert_membership(&membership).await?;

        activity::record(
            self.ctx.store.as_ref(),
            access.workspace_id(),
            None,
            access.actor.id,
            "member.invited",
            ActivitySubject::Member(membership.id),
            json!({ "user_id": user.id, "role": input.role }),
        )
        .await;

        notifier::dispatch(
            self.ctx.notifier.clone(),
            Notification::MemberInvited {
                workspace_id: access.workspace_id(),
                workspace_name: access.workspace.name.clone(),
                invitee_email: user.email,
                inviter_email: access.actor.email.clone(),
                role: input.role,
            },
        );

        Ok(membership)
    }

    pub async fn change_role(
        &self,
        access: &WorkspaceAccess,
        user_id: Uuid,
        input: ChangeRole,
    ) -> Result<Membership, ServiceError> {
        access.authorize(Action::ManageMembers)?;
        let mut target = self.find_member(access, user_id).await?;
        policy::check_role_change(access.role(), user_id == access.actor.id, target.role, input.role)?;

        let previous = target.role;
        self.ctx
            .store
            .update_membership_role(target.id, previous, input.role)
            .await?;
        target.role = input.role;

        activity::record(
            self.ctx.store.as_ref(),
            access.workspace_id(),
            None,
            access.actor.id,
            "member.role_changed",
            ActivitySubject::Member(target.id),
            json!({ "user_id": user_id, "from": previous, "to": input.role }),
        )
        .await;
        Ok(target)
    }

    pub async fn remove(&self, access: &WorkspaceAccess, user_id: Uuid) -> Result<(), ServiceError> {
        access.authorize(Action::ManageMembers)?;
        let target = self.find_member(access, user_id).await?;
        policy::check_removal(access.role(), user_id == access.actor.id, target.role)?;

        self.end_membership(&target).await?;
        activity::record(
            self.ctx.store.as_ref(),
            access.workspace_id(),
            None,
            access.actor.id,
            "member.removed",
            ActivitySubject::Member(target.id),
            json!({ "user_id": user_id }),
        )
        .await;
        Ok(())
    }

    /// The caller gives up their own membership
    pub async fn leave(&self, access: &WorkspaceAccess) -> Result<(), ServiceError> {
        policy::check_leave(access.role())?;

        self.end_membership(&access.membership).await?;
        activity::record(
            self.ctx.store.as_ref(),
            access.workspace_id(),
            None,
            access.actor.id,
            "member.left",
            ActivitySubject::Member(access.membership.id),
            json!({}),
        )
        .await;
        Ok(())
    }

    async fn find_member(&self, access: &WorkspaceAccess, user_id: Uuid) -> Result<Membership, ServiceError> {
        self.ctx
            .store
            .find_membership(access.workspace_id(), user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member"))
    }

    async fn end_membership(&self, membership: &Membership) -> Result<(), ServiceError> {
        self.ctx
            .store
            .end_membership(membership.id, membership.role, crate::database::now())
            .await?;
        Ok(())
    }
}
