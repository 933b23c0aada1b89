//! Users Backend Module
//!
//! Batch CRUD over user records whose shape is enforced by a composed
//! `UserDto` type.
//!
//! Clean Architecture structure:
//! - `domain/` - User DTO type, store port
//! - `application/` - Batch use cases and configuration
//! - `infra/` - In-memory store
//!
//! There is no transport here: callers (the `userctl` binary, tests) drive the
//! use cases directly and translate [`UserError`] into `kernel::AppError`.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::{
    CreateUsersUseCase, DeleteUsersUseCase, ListUsersUseCase, SearchUsersUseCase,
    UpdateUsersUseCase, UsersConfig,
};
pub use domain::store::UserStore;
pub use domain::user::{UserDto, UserDtoType};
pub use error::{UserError, UserResult};
pub use infra::memory::MemoryUserStore;

// Re-export kernel error types for unified error handling
pub use kernel::{AppError, AppResult, ErrorKind};
