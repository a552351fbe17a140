//! Service Module
//!
//! Business logic layer for the pipeline engine.
//! Services orchestrate between repositories and contain domain logic:
//! ownership checks, the stage invariants, transaction boundaries, and the
//! classification of storage errors into the engine's error taxonomy.

pub mod card;
pub mod pipeline;
pub mod stage;

// Re-export for convenience
pub use card as card_service;
pub use pipeline as pipeline_service;
pub use stage as stage_service;

use orderflow_core::domain::pipeline::Pipeline;
use orderflow_core::domain::principal::Principal;
use thiserror::Error;
use uuid::Uuid;

/// Service error taxonomy.
///
/// Storage failures are classified before they cross this boundary; callers
/// never see raw driver errors except as the opaque `Database` variant, which
/// the API layer renders as an internal error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: Uuid },

    #[error("caller is not allowed to manage this pipeline")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(resource: &'static str, id: Uuid) -> Self {
        Error::NotFound { resource, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }
}

/// Owner-or-admin check applied to every pipeline-scoped operation
pub fn authorize(principal: &Principal, pipeline: &Pipeline) -> Result<()> {
    if principal.is_admin() || principal.id == pipeline.owner_user_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// Whether a storage error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_core::domain::principal::Role;

    fn pipeline_owned_by(owner: Uuid) -> Pipeline {
        let now = chrono::Utc::now();
        Pipeline {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            owner_user_id: owner,
            name: "Sales".to_string(),
            description: None,
            settings: Default::default(),
            is_default: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_authorize_owner() {
        let owner = Uuid::new_v4();
        let principal = Principal {
            id: owner,
            role: Role::User,
        };
        assert!(authorize(&principal, &pipeline_owned_by(owner)).is_ok());
    }

    #[test]
    fn test_authorize_admin() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(authorize(&principal, &pipeline_owned_by(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_authorize_other_user_forbidden() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(matches!(
            authorize(&principal, &pipeline_owned_by(Uuid::new_v4())),
            Err(Error::Forbidden)
        ));
    }
}
