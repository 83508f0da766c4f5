use thiserror::Error;

use crate::database::store::{Constraint, StoreError};
use crate::services::identifiers::GenerationError;

/// Typed outcome of a rejected workspace operation. Never a partial success.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    GenerationExhausted(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }
}

fn conflict_message(constraint: Constraint) -> &'static str {
    match constraint {
        Constraint::WorkspaceSlug => "A workspace with this slug already exists",
        Constraint::ProjectKey => "A project with this key already exists in this workspace",
        Constraint::TicketNumber => "Another task claimed this ticket number; please retry",
        Constraint::Membership => "User is already a member of this workspace",
        Constraint::WorkspaceOwner => "This workspace already has an owner",
        Constraint::LabelName => "A label with this name already exists in this workspace",
        Constraint::UserEmail => "A user with this email already exists",
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => ServiceError::Conflict(conflict_message(constraint).to_string()),
            StoreError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            StoreError::Stale(what) => ServiceError::Conflict(format!(
                "{} was changed by another request; reload and retry",
                what
            )),
            other => ServiceError::Store(other),
        }
    }
}

impl From<GenerationError> for ServiceError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::EmptyBase(name) => ServiceError::Validation(format!(
                "Cannot derive an identifier from '{}'; supply one explicitly",
                name
            )),
            GenerationError::Exhausted { base, attempts } => ServiceError::GenerationExhausted(format!(
                "Could not find a free identifier for '{}' after {} attempts",
                base, attempts
            )),
            GenerationError::Store(e) => e.into(),
        }
    }
}
