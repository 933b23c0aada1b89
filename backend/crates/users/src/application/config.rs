//! Application Configuration
//!
//! Configuration for the Users application layer.

use crate::error::{UserError, UserResult};

/// Default upper bound on records per batch call
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Users application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersConfig {
    /// Maximum records (or ids) accepted by one batch call
    pub max_batch_size: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl UsersConfig {
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    /// Reject batches above the limit
    pub fn check_batch(&self, size: usize) -> UserResult<()> {
        if size > self.max_batch_size {
            return Err(UserError::BatchTooLarge {
                size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}
