//! Instance - immutable value produced by a derived type
//!
//! There is no `&mut` API: once [`DerivedType::construct`] returns, the data
//! fields and initialization state are fixed for the lifetime of the value.
//!
//! [`DerivedType::construct`]: crate::derived::DerivedType::construct

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::derived::DerivedType;
use crate::error::{ComposeError, ComposeResult};

/// Untyped key-value data record
pub type Record = Map<String, Value>;

/// Immutable instance of a derived type
#[derive(Clone)]
pub struct Instance {
    ty: DerivedType,
    /// Exactly the keys of the data record
    fields: Record,
    /// Initialization output not superseded by a data field
    state: Record,
}

impl Instance {
    pub(crate) fn new(ty: DerivedType, fields: Record, mut state: Record) -> Self {
        // data wins over initialization state of the same name
        state.retain(|key, _| !fields.contains_key(key));
        Self { ty, fields, state }
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn derived_type(&self) -> &DerivedType {
        &self.ty
    }

    /// Data fields, identical to the record the instance was built from
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    /// Initialization state left by the base type and extensions
    pub fn state(&self) -> &Record {
        &self.state
    }

    /// Data field only
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Data field, falling back to initialization state
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| self.state.get(name))
    }

    /// String data field
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn responds_to(&self, operation: &str) -> bool {
        self.ty.operation_origin(operation).is_some()
    }

    /// Run a named operation from the derived type's operation table
    pub fn call(&self, operation: &str, args: &[Value]) -> ComposeResult<Value> {
        let op = self
            .ty
            .operation(operation)
            .ok_or_else(|| ComposeError::UnknownOperation(operation.to_string()))?;
        Ok(op(self, args))
    }

    /// Data fields as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn into_record(self) -> Record {
        self.fields
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.fields == other.fields
            && self.state == other.state
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.type_name())
            .field("fields", &self.fields)
            .field("state", &self.state)
            .finish()
    }
}
