//! Users Error Types
//!
//! User-specific error variants that integrate with the unified
//! `kernel::AppError` system.

use composer::{ComposeError, ValidationError};
use kernel::{AppError, ErrorKind};
use thiserror::Error;

/// Users result type alias
pub type UserResult<T> = Result<T, UserError>;

/// Users error variants
#[derive(Debug, Error)]
pub enum UserError {
    /// Record failed the user schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Create with an id that is already stored
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// Update or delete of an id that is not stored
    #[error("User not found: {0}")]
    NotFound(String),

    /// Search without a query
    #[error("Missing search query")]
    MissingQuery,

    /// Search query could not be turned into a matcher
    #[error("Invalid search query: {0}")]
    InvalidQuery(#[from] regex::Error),

    /// Batch larger than `UsersConfig::max_batch_size`
    #[error("Batch of {size} records exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// UserDto type could not be composed
    #[error("User type composition failed: {0}")]
    Compose(#[from] ComposeError),
}

impl UserError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(_) | UserError::MissingQuery | UserError::InvalidQuery(_) => {
                ErrorKind::BadRequest
            }
            UserError::AlreadyExists(_) => ErrorKind::Conflict,
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::BatchTooLarge { .. } => ErrorKind::PayloadTooLarge,
            UserError::Compose(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            UserError::Compose(e) => {
                tracing::error!(error = %e, "User type composition error");
            }
            UserError::BatchTooLarge { size, max } => {
                tracing::warn!(size, max, "Rejected oversized user batch");
            }
            UserError::Validation(e) => {
                tracing::debug!(violations = e.violations().len(), error = %e, "User record rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Users error");
            }
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(validation) => validation.into(),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}
