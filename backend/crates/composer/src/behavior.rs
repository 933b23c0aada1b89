//! Behaviors and the operation table
//!
//! A [`Behavior`] is an explicit capability set: it declares the named
//! operations it contributes and, optionally, an initializer that runs when an
//! instance is constructed. Nothing is discovered reflectively.
//!
//! ## 合成規則
//! - 基底型が最も内側のレイヤー、その後ろに拡張を引数順に重ねる
//! - 同名のオペレーションは後のレイヤーが上書きする
//! - 上書きされなかったオペレーションはそのまま残る

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::instance::{Instance, Record};

/// Named operation: reads the instance, returns a value
pub type Operation = Arc<dyn Fn(&Instance, &[Value]) -> Value + Send + Sync>;

/// Construction hook: reads the data record, writes initialization state
pub type Initializer = Arc<dyn Fn(&Record, &mut Record) + Send + Sync>;

/// How the composer classifies a behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorKind {
    /// Type-like: constructible, candidate for the base type
    Type,
    /// Transform layered on top of the current chain
    Mixin,
}

/// Capability set contributed by a base type or a mixin
#[derive(Clone)]
pub struct Behavior {
    name: Arc<str>,
    kind: BehaviorKind,
    operations: Vec<(String, Operation)>,
    initializer: Option<Initializer>,
}

impl Behavior {
    fn new(name: &str, kind: BehaviorKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            operations: Vec::new(),
            initializer: None,
        }
    }

    /// Type-like behavior (base type candidate)
    pub fn base_type(name: &str) -> Self {
        Self::new(name, BehaviorKind::Type)
    }

    /// Mixin behavior
    pub fn mixin(name: &str) -> Self {
        Self::new(name, BehaviorKind::Mixin)
    }

    /// Register an operation; a second registration of the same name replaces the first
    pub fn with_operation<F>(mut self, name: &str, operation: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.operations.retain(|(existing, _)| existing != name);
        self.operations.push((name.to_string(), Arc::new(operation)));
        self
    }

    /// Register the initializer run at construction time
    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&Record, &mut Record) + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(initializer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BehaviorKind {
        self.kind
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("operations", &self.operation_names().collect::<Vec<_>>())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

struct Entry {
    operation: Operation,
    origin: Arc<str>,
}

/// Operation table of a derived type, resolved once at composition time
#[derive(Default)]
pub(crate) struct OperationTable {
    entries: BTreeMap<String, Entry>,
}

impl OperationTable {
    /// Fold layers innermost first; later layers override earlier ones by name
    pub(crate) fn fold<'a>(layers: impl IntoIterator<Item = &'a Behavior>) -> Self {
        let mut entries = BTreeMap::new();
        for layer in layers {
            for (name, operation) in &layer.operations {
                entries.insert(
                    name.clone(),
                    Entry {
                        operation: Arc::clone(operation),
                        origin: layer.shared_name(),
                    },
                );
            }
        }
        Self { entries }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Operation> {
        self.entries.get(name).map(|entry| &entry.operation)
    }

    /// Name of the layer that owns `name` after folding
    pub(crate) fn origin(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| &*entry.origin)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, &entry.origin)))
            .finish()
    }
}
