//! Update Users Use Case
//!
//! Replaces stored user records with new validated versions.

use serde_json::Value;
use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::domain::store::UserStore;
use crate::domain::user::{UserDto, UserDtoType};
use crate::error::{UserError, UserResult};

/// Update users use case
///
/// The stored user is looked up by the record's raw `id` before the record is
/// validated, so an unknown id is reported as `NotFound` even when the record
/// is also invalid.
pub struct UpdateUsersUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
    user_type: Arc<UserDtoType>,
    config: Arc<UsersConfig>,
}

impl<S> UpdateUsersUseCase<S>
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

        let mut updated = Vec::with_capacity(records.len());
        for record in records {
            let id = record_id(&record);
            if self.store.get(&id).await?.is_none() {
                return Err(UserError::NotFound(id));
            }

            let user = self.user_type.construct(record)?;
            self.store.set(user.id(), user.clone()).await?;
            updated.push(user);
        }

        tracing::info!(count = updated.len(), "Users updated");

        Ok(updated)
    }
}

/// Raw `id` of an unvalidated record; non-string ids keep their JSON spelling
fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
