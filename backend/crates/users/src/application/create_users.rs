//! Create Users Use Case
//!
//! Validates and stores a batch of new user records.

use serde_json::Value;
use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::domain::store::UserStore;
use crate::domain::user::{UserDto, UserDtoType};
use crate::error::{UserError, UserResult};

/// Create users use case
///
/// Records are handled in order. The first failure aborts the batch; records
/// stored before it stay stored.
pub struct CreateUsersUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    user_type: Arc<UserDtoType>,
    config: Arc<UsersConfig>,
}

impl<S> CreateUsersUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, user_type: Arc<UserDtoType>, config: Arc<UsersConfig>) -> Self {
        Self {
            store,
            user_type,
            config,
        }
    }

    pub async fn execute(&self, records: Vec<Value>) -> UserResult<Vec<UserDto>> {
        self.config.check_batch(records.len())?;

        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let user = self.user_type.construct(record)?;

            if self.store.get(user.id()).await?.is_some() {
                return Err(UserError::AlreadyExists(user.id().to_string()));
            }

            self.store.set(user.id(), user.clone()).await?;
            created.push(user);
        }

        tracing::info!(count = created.len(), "Users created");

        Ok(created)
    }
}
