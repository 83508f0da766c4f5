pub mod attachments;
pub mod auth;
pub mod comments;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod workspaces;
