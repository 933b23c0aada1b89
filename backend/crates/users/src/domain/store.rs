//! Store Port
//!
//! Interface for keeping user records. Implementation is in infrastructure layer.

use crate::domain::user::UserDto;
use crate::error::UserResult;

/// User store trait
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Find a user by id
    async fn get(&self, id: &str) -> UserResult<Option<UserDto>>;

    /// Insert or replace the user stored under `id`
    async fn set(&self, id: &str, user: UserDto) -> UserResult<()>;

    /// Remove the user stored under `id` (no-op when absent)
    async fn delete(&self, id: &str) -> UserResult<()>;

    /// All stored users
    async fn list(&self) -> UserResult<Vec<UserDto>>;
}
