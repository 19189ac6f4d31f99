use thiserror::Error;

use crate::forms::FormError;
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;

pub mod leads;

/// Outcome of a service call that did not succeed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller is not a superuser.
    #[error("unauthorized")]
    Unauthorized,

    /// Caller is neither the assignee nor a superuser.
    #[error("forbidden")]
    Forbidden,

    #[error("lead not found")]
    LeadNotFound,

    /// A referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    #[error("form error: {0}")]
    Form(String),

    #[error("type constraint violation: {0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

/// Fails with [`ServiceError::Unauthorized`] unless the caller is a superuser.
pub fn ensure_superuser(user: &AuthenticatedUser) -> ServiceResult<()> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}
