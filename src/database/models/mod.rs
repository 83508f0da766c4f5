pub mod activity;
pub mod attachment;
pub mod comment;
pub mod label;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
pub mod workspace;

pub use activity::{ActivityLog, ActivitySubject};
pub use attachment::{Attachment, AttachmentTarget};
pub use comment::Comment;
pub use label::Label;
pub use membership::{Membership, Role};
pub use project::{Project, ProjectStatus};
pub use task::{Task, TaskPriority, TaskStatus};
pub use user::User;
pub use workspace::{Workspace, WorkspaceSettings};
