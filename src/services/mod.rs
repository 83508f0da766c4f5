pub mod access;
pub mod activity;
pub mod attachment_service;
pub mod cascade;
pub mod comment_service;
pub mod error;
pub mod identifiers;
pub mod membership_service;
pub mod notifier;
pub mod policy;
pub mod project_service;
pub mod sequencer;
pub mod task_service;
pub mod workspace_service;

use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::database::store::{IdentityStore, Store};

pub use access::{authenticate_user, resolve_access, Actor, WorkspaceAccess};
pub use attachment_service::AttachmentService;
pub use cascade::CascadeOrchestrator;
pub use comment_service::CommentService;
pub use error::ServiceError;
pub use membership_service::MembershipService;
pub use notifier::{LogNotifier, Notification, Notifier};
pub use policy::Action;
pub use project_service::ProjectService;
pub use task_service::TaskService;
pub use workspace_service::WorkspaceService;

/// Shared handles every service is built from. Cloning copies the `Arc`s only.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityStore>,
    pub notifier: Arc<dyn Notifier>,
    pub generation: GenerationConfig,
}

impl ServiceContext {
    pub fn new(
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            store,
            identity,
            notifier,
            generation,
        }
    }

    pub fn workspaces(&self) -> WorkspaceService {
        WorkspaceService::new(self.clone())
    }

    pub fn members(&self) -> MembershipService {
        MembershipService::new(self.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.clone())
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.clone())
    }

    pub fn attachments(&self) -> AttachmentService {
        AttachmentService::new(self.clone())
    }

    pub fn cascade(&self) -> CascadeOrchestrator {
        CascadeOrchestrator::new(self.store.clone())
    }
}
