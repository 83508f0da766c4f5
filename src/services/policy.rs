// Workspace authorization policy.
//
// Every allow/deny decision for workspace-scoped actions lives in this file:
// the role predicates checked by the request gate, and the member-mutation
// guards (self-action, owner immutability, admin-on-admin).

use crate::database::models::{Role, WorkspaceSettings};
use crate::services::ServiceError;

/// Workspace-scoped actions a member may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewWorkspace,
    UpdateWorkspace,
    DeleteWorkspace,
    ListMembers,
    InviteMember,
    ManageMembers,
    ManageLabels,
    ViewActivity,
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateComment,
    /// Author-owned resources; `is_author` is whether the caller wrote it
    EditComment { is_author: bool },
    DeleteComment { is_author: bool },
    UploadAttachment,
    DeleteAttachment { is_author: bool },
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::ViewWorkspace => "view this workspace",
            Action::UpdateWorkspace => "update this workspace",
            Action::DeleteWorkspace => "delete this workspace",
            Action::ListMembers => "list members",
            Action::InviteMember => "invite members",
            Action::ManageMembers => "manage members",
            Action::ManageLabels => "manage labels",
            Action::ViewActivity => "view activity",
            Action::CreateProject => "create projects",
            Action::UpdateProject => "update projects",
            Action::DeleteProject => "delete projects",
            Action::CreateTask => "create tasks",
            Action::UpdateTask => "update tasks",
            Action::DeleteTask => "delete tasks",
            Action::CreateComment => "comment",
            Action::EditComment { .. } => "edit this comment",
            Action::DeleteComment { .. } => "delete this comment",
            Action::UploadAttachment => "upload attachments",
            Action::DeleteAttachment { .. } => "delete this attachment",
        }
    }
}

const ANY_ROLE: &[Role] = &[Role::Owner, Role::Admin, Role::Member, Role::Viewer];
const CONTRIBUTORS: &[Role] = &[Role::Owner, Role::Admin, Role::Member];
const ADMINS: &[Role] = &[Role::Owner, Role::Admin];
const OWNER_ONLY: &[Role] = &[Role::Owner];

/// Decide whether `role` may perform `action` in a workspace with `settings`
pub fn authorize(role: Role, settings: &WorkspaceSettings, action: Action) -> Result<(), ServiceError> {
    let allowed: &[Role] = match action {
        Action::ViewWorkspace | Action::ListMembers | Action::ViewActivity => ANY_ROLE,
        Action::UpdateWorkspace | Action::InviteMember | Action::ManageMembers | Action::ManageLabels => ADMINS,
        Action::DeleteWorkspace => OWNER_ONLY,
        Action::CreateProject => {
            if settings.allow_member_project_creation {
                CONTRIBUTORS
            } else {
                ADMINS
            }
        }
        Action::UpdateProject | Action::DeleteProject => ADMINS,
        Action::CreateTask
        | Action::UpdateTask
        | Action::DeleteTask
        | Action::CreateComment
        | Action::UploadAttachment => CONTRIBUTORS,
        Action::EditComment { is_author } => {
            return if is_author {
                Ok(())
            } else {
                Err(ServiceError::Forbidden("Only the author can edit this comment".to_string()))
            };
        }
        Action::DeleteComment { is_author } | Action::DeleteAttachment { is_author } => {
            if is_author {
                return Ok(());
            }
            ADMINS
        }
    };

    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "Role {} cannot {}; requires one of: {}",
            role,
            action.describe(),
            role_list(allowed)
        )))
    }
}

fn role_list(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

/// Roles a member may be invited with by `actor`
pub fn check_invite(actor: Role, role: Role) -> Result<(), ServiceError> {
    if role == Role::Owner {
        return Err(ServiceError::Validation("The OWNER role cannot be assigned by invitation".to_string()));
    }
    if role == Role::Admin && actor != Role::Owner {
        return Err(ServiceError::Forbidden("Only the workspace owner can grant the ADMIN role".to_string()));
    }
    Ok(())
}

/// A role change from `actor` onto another member currently holding `target`
pub fn check_role_change(actor: Role, is_self: bool, target: Role, new_role: Role) -> Result<(), ServiceError> {
    if is_self {
        return Err(ServiceError::Forbidden("You cannot change your own role".to_string()));
    }
    if new_role == Role::Owner {
        return Err(ServiceError::Validation("The OWNER role cannot be assigned".to_string()));
    }
    if target == Role::Owner {
        return Err(ServiceError::Forbidden("The workspace owner's role cannot be changed".to_string()));
    }
    guard_admin_target(actor, target)?;
    if new_role == Role::Admin && actor != Role::Owner {
        return Err(ServiceError::Forbidden("Only the workspace owner can grant the ADMIN role".to_string()));
    }
    Ok(())
}

/// Removal of a member holding `target` by `actor` through the admin path
pub fn check_removal(actor: Role, is_self: bool, target: Role) -> Result<(), ServiceError> {
    if is_self {
        return Err(ServiceError::Forbidden(
            "You cannot remove yourself; leave the workspace instead".to_string(),
        ));
    }
    if target == Role::Owner {
        return Err(ServiceError::Forbidden("The workspace owner cannot be removed".to_string()));
    }
    guard_admin_target(actor, target)
}

/// A member leaving of their own accord
pub fn check_leave(role: Role) -> Result<(), ServiceError> {
    if role == Role::Owner {
        return Err(ServiceError::Forbidden(
            "The workspace owner cannot leave; delete the workspace instead".to_string(),
        ));
    }
    Ok(())
}

fn guard_admin_target(actor: Role, target: Role) -> Result<(), ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::Forbidden("Requires one of: OWNER, ADMIN".to_string()));
    }
    if target == Role::Admin && actor != Role::Owner {
        return Err(ServiceError::Forbidden(
            "Only the workspace owner can modify another admin".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> WorkspaceSettings {
        WorkspaceSettings { allow_member_project_creation: true }
    }

    fn closed() -> WorkspaceSettings {
        WorkspaceSettings { allow_member_project_creation: false }
    }

    fn allowed(role: Role, settings: &WorkspaceSettings, action: Action) -> bool {
        authorize(role, settings, action).is_ok()
    }

    #[test]
    fn task_creation_excludes_viewers_only() {
        assert!(!allowed(Role::Viewer, &open(), Action::CreateTask));
        assert!(allowed(Role::Member, &open(), Action::CreateTask));
        assert!(allowed(Role::Admin, &open(), Action::CreateTask));
        assert!(allowed(Role::Owner, &open(), Action::CreateTask));
    }

    #[test]
    fn project_creation_depends_on_workspace_setting() {
        assert!(allowed(Role::Member, &open(), Action::CreateProject));
        assert!(!allowed(Role::Member, &closed(), Action::CreateProject));
        assert!(allowed(Role::Admin, &closed(), Action::CreateProject));
        assert!(allowed(Role::Owner, &closed(), Action::CreateProject));
        assert!(!allowed(Role::Viewer, &open(), Action::CreateProject));
    }

    #[test]
    fn author_or_admin_may_delete_comments_and_attachments() {
        for action in [
            Action::DeleteComment { is_author: true },
            Action::DeleteAttachment { is_author: true },
        ] {
            for role in Role::ALL {
                assert!(allowed(role, &open(), action), "{:?} {:?}", role, action);
            }
        }
        for action in [
            Action::DeleteComment { is_author: false },
            Action::DeleteAttachment { is_author: false },
        ] {
            assert!(allowed(Role::Owner, &open(), action));
            assert!(allowed(Role::Admin, &open(), action));
            assert!(!allowed(Role::Member, &open(), action));
            assert!(!allowed(Role::Viewer, &open(), action));
        }
    }

    #[test]
    fn only_owner_deletes_workspace() {
        for role in Role::ALL {
            assert_eq!(allowed(role, &open(), Action::DeleteWorkspace), role == Role::Owner);
        }
    }

    #[test]
    fn forbidden_message_names_required_roles() {
        let err = authorize(Role::Viewer, &open(), Action::InviteMember).unwrap_err();
        assert!(err.to_string().contains("OWNER, ADMIN"), "{}", err);
    }

    #[test]
    fn owner_role_is_never_assignable() {
        for actor in Role::ALL {
            assert!(check_invite(actor, Role::Owner).is_err());
            for target in [Role::Admin, Role::Member, Role::Viewer] {
                assert!(check_role_change(actor, false, target, Role::Owner).is_err());
            }
        }
    }

    #[test]
    fn admins_cannot_touch_other_admins() {
        assert!(check_role_change(Role::Admin, false, Role::Admin, Role::Member).is_err());
        assert!(check_removal(Role::Admin, false, Role::Admin).is_err());
        assert!(check_role_change(Role::Owner, false, Role::Admin, Role::Member).is_ok());
        assert!(check_removal(Role::Owner, false, Role::Admin).is_ok());
        assert!(check_role_change(Role::Admin, false, Role::Member, Role::Viewer).is_ok());
        assert!(check_removal(Role::Admin, false, Role::Viewer).is_ok());
    }

    #[test]
    fn self_actions_are_rejected() {
        assert!(check_role_change(Role::Owner, true, Role::Owner, Role::Admin).is_err());
        assert!(check_role_change(Role::Admin, true, Role::Admin, Role::Member).is_err());
        assert!(check_removal(Role::Admin, true, Role::Admin).is_err());
        assert!(check_leave(Role::Owner).is_err());
        assert!(check_leave(Role::Admin).is_ok());
        assert!(check_leave(Role::Viewer).is_ok());
    }

    #[test]
    fn owner_membership_is_immutable() {
        for actor in [Role::Owner, Role::Admin] {
            assert!(check_role_change(actor, false, Role::Owner, Role::Admin).is_err());
            assert!(check_removal(actor, false, Role::Owner).is_err());
        }
    }

    #[test]
    fn members_cannot_manage_members() {
        assert!(check_role_change(Role::Member, false, Role::Viewer, Role::Member).is_err());
        assert!(check_removal(Role::Viewer, false, Role::Member).is_err());
    }

    #[test]
    fn only_owner_grants_admin() {
        assert!(check_invite(Role::Admin, Role::Admin).is_err());
        assert!(check_invite(Role::Owner, Role::Admin).is_ok());
        assert!(check_invite(Role::Admin, Role::Member).is_ok());
        assert!(check_role_change(Role::Admin, false, Role::Member, Role::Admin).is_err());
        assert!(check_role_change(Role::Owner, false, Role::Member, Role::Admin).is_ok());
    }
}
