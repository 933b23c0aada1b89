//! Composer Error Types
//!
//! Two failure families exist:
//! - composition time: an argument is not a behavior or a usable schema
//! - construction time: a data record does not satisfy the combined schema
//!
//! Both integrate with the unified `kernel::AppError` system.

use kernel::{AppError, ErrorKind};
use thiserror::Error;

use crate::schema::Violation;

/// Composer result type alias
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Composer error variants
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Argument is neither a behavior nor a shape-describing schema object
    #[error("Invalid argument at position {position}: expected a behavior or a schema, got {kind}")]
    InvalidArgument { position: usize, kind: String },

    /// Schema object was recognized but cannot be compiled
    #[error("Invalid schema at position {position}: {reason}")]
    InvalidSchema { position: usize, reason: String },

    /// Data record failed the combined schema
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operation name not present in the derived type's operation table
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl ComposeError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComposeError::Validation(_) => ErrorKind::BadRequest,
            ComposeError::InvalidArgument { .. }
            | ComposeError::InvalidSchema { .. }
            | ComposeError::UnknownOperation(_) => ErrorKind::InternalServerError,
        }
    }
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Validation(validation) => validation.into(),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}

/// Construction-time validation failure
///
/// Carries every violation found, not only the first one. No instance is
/// ever produced alongside this error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("DTO validation failed: {summary}")]
pub struct ValidationError {
    summary: String,
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        let summary = crate::schema::violation::summarize(&violations);
        Self {
            summary,
            violations,
        }
    }

    /// Human-readable summary, e.g. `data/id is a required property`
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let details: Vec<String> = err.violations.iter().map(ToString::to_string).collect();
        AppError::bad_request(err.to_string()).with_details(details)
    }
}
