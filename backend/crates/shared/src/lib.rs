//! Shared Kernel - vocabulary shared by every crate in the workspace
//!
//! This crate only holds what has the same meaning everywhere:
//! - The unified application error ([`error::app_error::AppError`])
//! - Error classification ([`error::kind::ErrorKind`]) and status mapping
//! - Conversions from std / serde_json errors
//!
//! Domain crates (`composer`, `users`) keep their own `thiserror` enums and
//! convert into [`error::app_error::AppError`] at the boundary.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}

pub use error::app_error::{AppError, AppResult};
pub use error::kind::ErrorKind;
