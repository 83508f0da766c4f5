// Outbound notices (mail in production). Fire-and-forget: a failed send is
// logged and never undoes the write that triggered it.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::Role;

#[derive(Debug, Clone)]
pub enum Notification {
    WorkspaceCreated {
        workspace_id: Uuid,
        workspace_name: String,
        owner_email: String,
    },
    MemberInvited {
        workspace_id: Uuid,
        workspace_name: String,
        invitee_email: String,
        inviter_email: String,
        role: Role,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Writes notices to the log instead of a mail transport
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        match &notification {
            Notification::WorkspaceCreated { workspace_name, owner_email, .. } => {
                tracing::info!("notify {}: workspace '{}' created", owner_email, workspace_name);
            }
            Notification::MemberInvited {
                workspace_name,
                invitee_email,
                inviter_email,
                role,
                ..
            } => {
                tracing::info!(
                    "notify {}: invited to '{}' as {} by {}",
                    invitee_email,
                    workspace_name,
                    role,
                    inviter_email
                );
            }
        }
        Ok(())
    }
}

/// Send on a background task; the caller never waits on or sees the outcome
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send(notification).await {
            tracing::warn!("Notification delivery failed: {:#}", e);
        }
    });
}
