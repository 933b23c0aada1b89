//! List Users Use Case

use std::sync::Arc;

use crate::domain::store::UserStore;
use crate::domain::user::UserDto;
use crate::error::UserResult;

/// List users use case
pub struct ListUsersUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
}

impl<S> ListUsersUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> UserResult<Vec<UserDto>> {
        self.store.list().await
    }
}
