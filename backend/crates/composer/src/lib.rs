//! Composer - validated type composition
//!
//! Builds a derived type out of an ordered argument list:
//! - zero or one base type (innermost behavior layer)
//! - zero or more mixins (layered in order, later ones override by name)
//! - zero or more structural schemas (none: no validation, one: used directly,
//!   several: combined with `allOf`)
//!
//! Every construction runs the initializers, validates the original data
//! record, then returns an immutable [`Instance`]. Failing records never
//! produce an instance.
//!
//! ## Example
//! ```rust
//! use composer::{Behavior, Composer};
//! use serde_json::json;
//!
//! let user_dto = Composer::new("UserDto")
//!     .arg(Behavior::base_type("BaseUser").with_operation("kind", |_, _| json!("user")))
//!     .arg(json!({
//!         "type": "object",
//!         "required": ["id"],
//!         "properties": {
//!             "id": {"type": "string"},
//!             "email": {"type": "string", "format": "email"}
//!         }
//!     }))
//!     .build()
//!     .unwrap();
//!
//! assert!(user_dto.construct_value(json!({"id": "1", "email": "bad"})).is_err());
//! let user = user_dto
//!     .construct_value(json!({"id": "1", "email": "ok@example.com"}))
//!     .unwrap();
//! assert_eq!(user.field("email"), Some(&json!("ok@example.com")));
//! ```

pub mod argument;
pub mod behavior;
pub mod derived;
pub mod error;
pub mod instance;
pub mod schema;

// Re-exports for convenience
pub use argument::Argument;
pub use behavior::{Behavior, BehaviorKind, Initializer, Operation};
pub use derived::{Composer, DerivedType, compose};
pub use error::{ComposeError, ComposeResult, ValidationError};
pub use instance::{Instance, Record};
pub use schema::{Validator, Violation};

#[cfg(test)]
mod tests;
