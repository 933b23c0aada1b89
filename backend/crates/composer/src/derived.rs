//! Derived Type - output of the composer
//!
//! A derived type is created once and reused for every construction. Its
//! operation table and validator are resolved at composition time and never
//! recompiled.
//!
//! ## Construct の手順
//! 1. 基底型 → 拡張の順に初期化処理を実行
//! 2. バリデータがあれば**元の**データレコードを検証（失敗時はインスタンスを返さない）
//! 3. データレコードの全キーをインスタンスに割り当て（同名の初期化状態より優先）
//! 4. 不変の値として返す
//!
//! ## last_errors について
//! `last_errors` は型ごとに1つの共有スロットです。同じ型を複数スレッドから
//! 検証すると、他の呼び出しのエラー一覧が見える可能性があります。
//! 呼び出しごとのエラーが必要な場合は [`DerivedType::check`] を使ってください。

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::argument::{Argument, classify};
use crate::behavior::{Behavior, Operation, OperationTable};
use crate::error::{ComposeError, ComposeResult, ValidationError};
use crate::instance::{Instance, Record};
use crate::schema::{Validator, Violation};

/// Compose a derived type from an ordered argument list
///
/// ```rust
/// use composer::{Behavior, compose};
/// use serde_json::json;
///
/// let dto = compose(
///     "UserDto",
///     vec![
///         Behavior::base_type("BaseUser")
///             .with_operation("kind", |_, _| json!("user"))
///             .into(),
///         json!({"type": "object", "required": ["id"]}).into(),
///     ],
/// )
/// .unwrap();
///
/// let user = dto.construct_value(json!({"id": "1"})).unwrap();
/// assert_eq!(user.call("kind", &[]).unwrap(), json!("user"));
/// assert!(!dto.validate(&serde_json::Map::new()));
/// ```
pub fn compose(name: &str, args: Vec<Argument>) -> ComposeResult<DerivedType> {
    let classified = classify(args)?;

    let validator = if classified.schemas.is_empty() {
        None
    } else {
        let (positions, schemas): (Vec<usize>, Vec<Value>) =
            classified.schemas.into_iter().unzip();
        let validator = Validator::combine(schemas).map_err(|(index, err)| {
            ComposeError::InvalidSchema {
                position: positions.get(index).copied().unwrap_or(index),
                reason: err.to_string(),
            }
        })?;
        Some(validator)
    };

    let operations = OperationTable::fold(classified.base.iter().chain(&classified.extensions));

    tracing::debug!(
        derived_type = name,
        base = classified.base.as_ref().map(Behavior::name),
        extensions = classified.extensions.len(),
        operations = ?operations,
        validated = validator.is_some(),
        "Composed derived type"
    );

    Ok(DerivedType {
        inner: Arc::new(Inner {
            name: name.to_string(),
            base: classified.base,
            extensions: classified.extensions,
            operations,
            validator,
            last_errors: Mutex::new(Vec::new()),
        }),
    })
}

/// Builder over [`compose`]
///
/// ```rust
/// use composer::{Behavior, Composer};
/// use serde_json::json;
///
/// let dto = Composer::new("Empty").build().unwrap();
/// assert!(dto.validate(&serde_json::Map::new()));
///
/// let dto = Composer::new("Tagged")
///     .arg(Behavior::mixin("Tag").with_operation("tag", |_, _| json!("t")))
///     .arg(json!({"type": "object"}))
///     .build()
///     .unwrap();
/// assert!(dto.has_validator());
/// ```
#[derive(Debug)]
pub struct Composer {
    name: String,
    args: Vec<Argument>,
}

impl Composer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn build(self) -> ComposeResult<DerivedType> {
        compose(&self.name, self.args)
    }
}

struct Inner {
    name: String,
    base: Option<Behavior>,
    extensions: Vec<Behavior>,
    operations: OperationTable,
    validator: Option<Validator>,
    last_errors: Mutex<Vec<Violation>>,
}

/// Composed type: constructor, validator and operation table in one handle
///
/// Cloning is cheap and clones share `last_errors`.
#[derive(Clone)]
pub struct DerivedType {
    inner: Arc<Inner>,
}

impl DerivedType {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Build an immutable instance from a data record
    pub fn construct(&self, data: Record) -> Result<Instance, ValidationError> {
        let mut state = Record::new();
        for layer in self.layers() {
            if let Some(initializer) = layer.initializer() {
                initializer(&data, &mut state);
            }
        }

        if let Some(validator) = &self.inner.validator {
            let violations = validator.violations(&Value::Object(data.clone()));
            self.store_last_errors(&violations);
            if !violations.is_empty() {
                let err = ValidationError::new(violations);
                tracing::debug!(derived_type = %self.inner.name, error = %err, "Construction rejected");
                return Err(err);
            }
        }

        Ok(Instance::new(self.clone(), data, state))
    }

    /// Build an instance from an untyped value; anything but an object is rejected
    pub fn construct_value(&self, data: Value) -> Result<Instance, ValidationError> {
        match data {
            Value::Object(record) => self.construct(record),
            _ => {
                let violations = vec![Violation::new("", "type", "must be object")];
                self.store_last_errors(&violations);
                Err(ValidationError::new(violations))
            }
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate without constructing; updates [`last_errors`](Self::last_errors)
    pub fn validate(&self, data: &Record) -> bool {
        let Some(validator) = &self.inner.validator else {
            return true;
        };
        let violations = validator.violations(&Value::Object(data.clone()));
        self.store_last_errors(&violations);
        violations.is_empty()
    }

    /// Validate and return the violations directly; shared state is untouched
    pub fn check(&self, data: &Record) -> Result<(), ValidationError> {
        let Some(validator) = &self.inner.validator else {
            return Ok(());
        };
        let violations = validator.violations(&Value::Object(data.clone()));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Violations from the most recent validator run (empty after a passing run)
    pub fn last_errors(&self) -> Vec<Violation> {
        self.inner
            .last_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_last_errors(&self, violations: &[Violation]) {
        let mut slot = self
            .inner
            .last_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.clear();
        slot.extend_from_slice(violations);
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Name of the base type, if any
    pub fn base(&self) -> Option<&str> {
        self.inner.base.as_ref().map(Behavior::name)
    }

    /// Extension names in layering order
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.inner.extensions.iter().map(Behavior::name)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.inner.operations.names()
    }

    /// Layer that provides `operation` after overriding
    pub fn operation_origin(&self, operation: &str) -> Option<&str> {
        self.inner.operations.origin(operation)
    }

    pub fn has_validator(&self) -> bool {
        self.inner.validator.is_some()
    }

    /// Combined schema document, `None` without a validator
    pub fn schema(&self) -> Option<&Value> {
        self.inner.validator.as_ref().map(Validator::source)
    }

    pub(crate) fn operation(&self, name: &str) -> Option<&Operation> {
        self.inner.operations.get(name)
    }

    fn layers(&self) -> impl Iterator<Item = &Behavior> {
        self.inner.base.iter().chain(&self.inner.extensions)
    }
}

impl fmt::Debug for DerivedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedType")
            .field("name", &self.inner.name)
            .field("base", &self.base())
            .field("extensions", &self.extensions().collect::<Vec<_>>())
            .field("operations", &self.inner.operations)
            .field("validated", &self.has_validator())
            .finish()
    }
}
