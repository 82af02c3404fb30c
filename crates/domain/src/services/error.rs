//! Error type shared by the domain services.

use shared::password::PasswordError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::repositories::RepositoryError;
use crate::services::mailer::MailError;
use crate::services::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("Maximum number of guarantors reached")]
    CapacityExceeded,

    #[error("Guarantor already exists")]
    DuplicateGuarantor,

    #[error("Invalid invitation token")]
    InvalidToken,

    #[error("Invitation token has expired")]
    ExpiredToken,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Email delivery failed: {0}")]
    MailDelivery(#[from] MailError),

    #[error("File storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}
