//! Domain Layer
//!
//! Contains the composed user DTO type and the store port.

pub mod store;
pub mod user;

// Re-exports
pub use store::UserStore;
pub use user::{UserDto, UserDtoType};
