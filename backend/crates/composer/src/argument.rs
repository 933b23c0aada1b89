//! Composition arguments and their classification
//!
//! Classification rule, applied once per argument in order:
//! 1. the first [`BehaviorKind::Type`] behavior becomes the base type
//! 2. every later `Type` behavior and every `Mixin` becomes an extension,
//!    kept in argument order
//! 3. a JSON object with a shape key (`type`, `properties`, `allOf`, `anyOf`)
//!    is a structural schema
//! 4. anything else is rejected with [`ComposeError::InvalidArgument`]
//!
//! The base type is always the innermost layer, so `(Mixin, Type)` and
//! `(Type, Mixin)` produce the same derived type.

use serde_json::Value;

use crate::behavior::{Behavior, BehaviorKind};
use crate::error::{ComposeError, ComposeResult};
use crate::schema::is_schema_shaped;

/// One element of a composition request
#[derive(Debug, Clone)]
pub enum Argument {
    Behavior(Behavior),
    Schema(Value),
}

impl From<Behavior> for Argument {
    fn from(behavior: Behavior) -> Self {
        Argument::Behavior(behavior)
    }
}

impl From<Value> for Argument {
    fn from(schema: Value) -> Self {
        Argument::Schema(schema)
    }
}

/// Arguments sorted into their categories
#[derive(Debug, Default)]
pub(crate) struct Classified {
    pub base: Option<Behavior>,
    pub extensions: Vec<Behavior>,
    /// (argument position, schema document)
    pub schemas: Vec<(usize, Value)>,
}

pub(crate) fn classify(args: Vec<Argument>) -> ComposeResult<Classified> {
    let mut classified = Classified::default();

    for (position, arg) in args.into_iter().enumerate() {
        match arg {
            Argument::Behavior(behavior) => {
                if behavior.kind() == BehaviorKind::Type && classified.base.is_none() {
                    classified.base = Some(behavior);
                } else {
                    classified.extensions.push(behavior);
                }
            }
            Argument::Schema(schema) if is_schema_shaped(&schema) => {
                classified.schemas.push((position, schema));
            }
            Argument::Schema(other) => {
                return Err(ComposeError::InvalidArgument {
                    position,
                    kind: describe(&other).to_string(),
                });
            }
        }
    }

    Ok(classified)
}

/// Observed kind of a rejected argument
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object without type/properties/allOf/anyOf",
    }
}
