//! Application Layer
//!
//! Batch use cases over the user store.

pub mod config;
pub mod create_users;
pub mod delete_users;
pub mod list_users;
pub mod search_users;
pub mod update_users;

// Re-exports
pub use config::UsersConfig;
pub use create_users::CreateUsersUseCase;
pub use delete_users::DeleteUsersUseCase;
pub use list_users::ListUsersUseCase;
pub use search_users::SearchUsersUseCase;
pub use update_users::UpdateUsersUseCase;
