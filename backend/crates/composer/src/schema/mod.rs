//! Structural Schema
//!
//! JSON-schema shaped contracts used to validate data records before a
//! derived type constructs an instance. Zero schemas means no validator,
//! one schema is used as-is, several are combined with `allOf`.
//!
//! Every keyword either takes part in validation or is a known annotation
//! (`title`, `description`, ...). Anything else fails compilation, so a
//! schema is never weakened by a keyword the validator does not enforce.

mod compile;
pub mod format;
pub mod violation;

use serde_json::Value;

pub use compile::SchemaError;
pub use format::Format;
pub use violation::Violation;

use compile::{Definitions, Node};

/// Keys that mark a JSON object as a structural schema
pub const SHAPE_KEYS: [&str; 4] = ["type", "properties", "allOf", "anyOf"];

/// Whether `value` is an object exposing at least one shape-descriptor key
pub fn is_schema_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| SHAPE_KEYS.iter().any(|key| map.get(*key).is_some_and(|v| !v.is_null())))
}

/// Compiled validator for one or more schemas
#[derive(Debug)]
pub struct Validator {
    root: Node,
    definitions: Definitions,
    source: Value,
}

impl Validator {
    /// Compile a single schema document
    pub fn compile(schema: Value) -> Result<Self, SchemaError> {
        let mut definitions = Definitions::default();
        let root = Node::compile(&schema, &mut definitions)?;
        Ok(Self {
            root,
            definitions,
            source: schema,
        })
    }

    /// Compile several schemas into their conjunction
    ///
    /// A single schema is compiled as-is. The error carries the index of the
    /// first schema that failed to compile.
    pub fn combine(schemas: Vec<Value>) -> Result<Self, (usize, SchemaError)> {
        let schemas = match <[Value; 1]>::try_from(schemas) {
            Ok([single]) => return Self::compile(single).map_err(|e| (0, e)),
            Err(schemas) => schemas,
        };

        let mut definitions = Definitions::default();
        let nodes = schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| Node::compile(schema, &mut definitions).map_err(|e| (index, e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: Node::all_of(nodes),
            definitions,
            source: serde_json::json!({ "allOf": schemas }),
        })
    }

    /// Schema document this validator was compiled from
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Every violation of `value`, in schema order
    pub fn violations(&self, value: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        self.root.check(&self.definitions, value, "", &mut out);
        out
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.root.is_valid(&self.definitions, value)
    }
}
