//! Delete Users Use Case

use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::domain::store::UserStore;
use crate::error::{UserError, UserResult};

/// Delete users use case
pub struct DeleteUsersUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    config: Arc<UsersConfig>,
}

impl<S> DeleteUsersUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, config: Arc<UsersConfig>) -> Self {
        Self { store, config }
    }

    /// Delete every id in order; an unknown id aborts the remaining deletes
    pub async fn execute(&self, ids: Vec<String>) -> UserResult<()> {
        self.config.check_batch(ids.len())?;

        for id in &ids {
            if self.store.get(id).await?.is_none() {
                return Err(UserError::NotFound(id.clone()));
            }
            self.store.delete(id).await?;
        }

        tracing::info!(count = ids.len(), "Users deleted");

        Ok(())
    }
}
