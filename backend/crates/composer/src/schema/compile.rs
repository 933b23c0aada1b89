//! Schema compiler and validator
//!
//! A JSON schema document (draft-07 vocabulary plus `dependentRequired` and
//! `dependentSchemas`) is compiled once into a [`Node`] tree. Validation walks
//! the tree and collects every violation instead of stopping at the first one.
//!
//! ## 不変条件
//! - コンパイル後のノードは不変（検証ごとの再コンパイルはしない）
//! - 型に依存するキーワードは該当する型の値にのみ適用される
//! - 未知のキーワードはコンパイルエラー（`title` などの注釈キーワードのみ許可）
//! - `$ref` は同じドキュメント内の JSON ポインタのみ。参照先は [`Definitions`] に一度だけコンパイルする
//! - 値を消費しない参照の循環（`{"$ref": "#"}` など）はコンパイルエラー

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::format::Format;
use super::violation::{Violation, child_path};

/// Keywords with validation semantics
const VALIDATION_KEYWORDS: &[&str] = &[
    "$ref",
    "definitions",
    "$defs",
    "type",
    "enum",
    "const",
    "properties",
    "patternProperties",
    "additionalProperties",
    "propertyNames",
    "required",
    "dependencies",
    "dependentRequired",
    "dependentSchemas",
    "minProperties",
    "maxProperties",
    "items",
    "additionalItems",
    "contains",
    "minContains",
    "maxContains",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
];

/// Keywords accepted without any effect on validation
const ANNOTATION_KEYWORDS: &[&str] = &[
    "$id",
    "$schema",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "readOnly",
    "writeOnly",
    "deprecated",
];

/// Compilation failure, located by a pointer into the schema document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub location: String,
    pub reason: String,
}

impl SchemaError {
    fn new(location: &str, reason: impl Into<String>) -> Self {
        Self {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.location.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.location, self.reason)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        let ty = match name {
            "object" => JsonType::Object,
            "array" => JsonType::Array,
            "string" => JsonType::String,
            "number" => JsonType::Number,
            "integer" => JsonType::Integer,
            "boolean" => JsonType::Boolean,
            "null" => JsonType::Null,
            _ => return None,
        };
        Some(ty)
    }

    const fn as_str(&self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (JsonType::Object, Value::Object(_)) => true,
            (JsonType::Array, Value::Array(_)) => true,
            (JsonType::String, Value::String(_)) => true,
            (JsonType::Number, Value::Number(_)) => true,
            (JsonType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (JsonType::Boolean, Value::Bool(_)) => true,
            (JsonType::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// JSON equality with numbers compared by value (`1 == 1.0`)
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || ((x.is_f64() || y.is_f64()) && x.as_f64() == y.as_f64())
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Numeric bound keeping the schema's own spelling for messages
#[derive(Debug, Clone)]
struct Bound {
    value: f64,
    text: String,
}

/// `additionalProperties` / `additionalItems`
#[derive(Debug, Default)]
enum Additional {
    #[default]
    Allow,
    Deny,
    Schema(Box<Node>),
}

#[derive(Debug)]
enum Items {
    Each(Box<Node>),
    Tuple(Vec<Node>),
}

#[derive(Debug)]
struct Pattern {
    source: String,
    regex: Regex,
}

/// Names required once `property` is present
#[derive(Debug)]
struct Dependency {
    keyword: &'static str,
    property: String,
    required: Vec<String>,
}

#[derive(Debug)]
struct Conditional {
    condition: Node,
    then: Option<Node>,
    otherwise: Option<Node>,
}

/// Compiled schema node
#[derive(Debug, Default)]
pub(crate) struct Node {
    reject_all: bool,
    /// Index into [`Definitions`]
    reference: Option<usize>,
    types: Option<Vec<JsonType>>,
    properties: Vec<(String, Node)>,
    pattern_properties: Vec<(Pattern, Node)>,
    property_names: Option<Box<Node>>,
    required: Vec<String>,
    additional: Additional,
    dependent_required: Vec<Dependency>,
    dependent_schemas: Vec<(String, Node)>,
    items: Option<Items>,
    additional_items: Additional,
    contains: Option<Box<Node>>,
    min_contains: Option<usize>,
    max_contains: Option<usize>,
    unique_items: bool,
    enumeration: Option<Vec<Value>>,
    constant: Option<Value>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
    format: Option<Format>,
    minimum: Option<Bound>,
    maximum: Option<Bound>,
    exclusive_minimum: Option<Bound>,
    exclusive_maximum: Option<Bound>,
    multiple_of: Option<Bound>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    min_properties: Option<usize>,
    max_properties: Option<usize>,
    all_of: Vec<Node>,
    any_of: Vec<Node>,
    one_of: Vec<Node>,
    not: Option<Box<Node>>,
    conditional: Option<Box<Conditional>>,
}

/// `$ref` targets, compiled once and shared by every node that points at them
#[derive(Debug, Default)]
pub(crate) struct Definitions {
    nodes: Vec<Node>,
    locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

impl Definitions {
    fn reserve(&mut self, location: &str) -> usize {
        self.nodes.push(Node::default());
        self.locations.push(location.to_string());
        self.nodes.len() - 1
    }

    fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Reject reference chains that loop back without descending into the value
    fn check_cycles(&self) -> Result<(), SchemaError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        for index in 0..self.nodes.len() {
            self.visit(index, &mut marks)?;
        }
        Ok(())
    }

    fn visit(&self, index: usize, marks: &mut [Mark]) -> Result<(), SchemaError> {
        match marks[index] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                return Err(SchemaError::new(
                    &self.locations[index],
                    "reference cycle never reaches a nested value",
                ));
            }
            Mark::Unvisited => {}
        }
        marks[index] = Mark::Active;
        let mut next = Vec::new();
        self.nodes[index].inline_refs(&mut next);
        for target in next {
            self.visit(target, marks)?;
        }
        marks[index] = Mark::Done;
        Ok(())
    }
}

impl Node {
    /// Compile a schema document (object or boolean schema)
    ///
    /// `$ref` targets land in `definitions`; the returned node is only valid
    /// together with it.
    pub(crate) fn compile(
        schema: &Value,
        definitions: &mut Definitions,
    ) -> Result<Self, SchemaError> {
        let mut compiler = Compiler {
            document: schema,
            definitions: &mut *definitions,
            slots: HashMap::new(),
            pending: Vec::new(),
        };
        let root = compiler.node(schema, "")?;
        compiler.resolve_pending()?;
        definitions.check_cycles()?;
        Ok(root)
    }

    /// Conjunction of already compiled nodes (`allOf`)
    pub(crate) fn all_of(nodes: Vec<Node>) -> Self {
        Self {
            all_of: nodes,
            ..Self::default()
        }
    }

    /// Validate `value`, appending violations to `out`
    pub(crate) fn check(
        &self,
        defs: &Definitions,
        value: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if self.reject_all {
            out.push(Violation::new(path, "false", "boolean schema is false"));
            return;
        }

        if let Some(target) = self.reference.and_then(|index| defs.get(index)) {
            target.check(defs, value, path, out);
        }

        if let Some(types) = &self.types {
            if !types.iter().any(|ty| ty.accepts(value)) {
                let names: Vec<&str> = types.iter().map(JsonType::as_str).collect();
                out.push(Violation::new(
                    path,
                    "type",
                    format!("must be {}", names.join(",")),
                ));
            }
        }

        if let Some(allowed) = &self.enumeration {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                out.push(Violation::new(
                    path,
                    "enum",
                    "must be equal to one of the allowed values",
                ));
            }
        }

        if let Some(constant) = &self.constant {
            if !json_equal(constant, value) {
                out.push(Violation::new(path, "const", "must be equal to constant"));
            }
        }

        match value {
            Value::Object(map) => {
                self.check_object(defs, map, path, out);
                for (property, node) in &self.dependent_schemas {
                    if map.contains_key(property) {
                        node.check(defs, value, path, out);
                    }
                }
            }
            Value::Array(items) => self.check_array(defs, items, path, out),
            Value::String(s) => self.check_string(s, path, out),
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    self.check_number(f, path, out);
                }
            }
            Value::Bool(_) | Value::Null => {}
        }

        for node in &self.all_of {
            node.check(defs, value, path, out);
        }

        if !self.any_of.is_empty() && !self.any_of.iter().any(|node| node.is_valid(defs, value)) {
            out.push(Violation::new(path, "anyOf", "must match a schema in anyOf"));
        }

        if !self.one_of.is_empty() {
            let passing = self
                .one_of
                .iter()
                .filter(|node| node.is_valid(defs, value))
                .count();
            if passing != 1 {
                out.push(Violation::new(
                    path,
                    "oneOf",
                    "must match exactly one schema in oneOf",
                ));
            }
        }

        if let Some(not) = &self.not {
            if not.is_valid(defs, value) {
                out.push(Violation::new(path, "not", "must NOT be valid"));
            }
        }

        if let Some(conditional) = &self.conditional {
            let branch = if conditional.condition.is_valid(defs, value) {
                conditional.then.as_ref().map(|node| (node, "then"))
            } else {
                conditional.otherwise.as_ref().map(|node| (node, "else"))
            };
            if let Some((node, name)) = branch {
                let before = out.len();
                node.check(defs, value, path, out);
                if out.len() > before {
                    out.push(Violation::new(
                        path,
                        "if",
                        format!("must match \"{name}\" schema"),
                    ));
                }
            }
        }
    }

    pub(crate) fn is_valid(&self, defs: &Definitions, value: &Value) -> bool {
        let mut out = Vec::new();
        self.check(defs, value, "", &mut out);
        out.is_empty()
    }

    /// References applied to the same value (not to a child of it)
    fn inline_refs(&self, out: &mut Vec<usize>) {
        out.extend(self.reference);
        let same_value = self
            .all_of
            .iter()
            .chain(&self.any_of)
            .chain(&self.one_of)
            .chain(self.dependent_schemas.iter().map(|(_, node)| node))
            .chain(self.not.as_deref());
        for node in same_value {
            node.inline_refs(out);
        }
        if let Some(conditional) = &self.conditional {
            conditional.condition.inline_refs(out);
            for node in conditional.then.iter().chain(&conditional.otherwise) {
                node.inline_refs(out);
            }
        }
    }

    fn check_object(
        &self,
        defs: &Definitions,
        map: &Map<String, Value>,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        for name in &self.required {
            if !map.contains_key(name) {
                out.push(Violation::new(
                    child_path(path, name),
                    "required",
                    "is a required property",
                ));
            }
        }

        for dependency in &self.dependent_required {
            if !map.contains_key(&dependency.property) {
                continue;
            }
            for name in &dependency.required {
                if !map.contains_key(name) {
                    out.push(Violation::new(
                        path,
                        dependency.keyword,
                        format!(
                            "must have property {name} when property {} is present",
                            dependency.property
                        ),
                    ));
                }
            }
        }

        for (name, node) in &self.properties {
            if let Some(field) = map.get(name) {
                node.check(defs, field, &child_path(path, name), out);
            }
        }

        for (name, field) in map {
            let child = child_path(path, name);
            let mut matched = self.properties.iter().any(|(declared, _)| declared == name);
            for (pattern, node) in &self.pattern_properties {
                if pattern.regex.is_match(name) {
                    matched = true;
                    node.check(defs, field, &child, out);
                }
            }
            if matched {
                continue;
            }
            match &self.additional {
                Additional::Allow => {}
                Additional::Deny => out.push(Violation::new(
                    child,
                    "additionalProperties",
                    "must NOT be an additional property",
                )),
                Additional::Schema(node) => node.check(defs, field, &child, out),
            }
        }

        if let Some(names) = &self.property_names {
            for name in map.keys() {
                if !names.is_valid(defs, &Value::String(name.clone())) {
                    out.push(Violation::new(
                        path,
                        "propertyNames",
                        format!("property name \"{name}\" is invalid"),
                    ));
                }
            }
        }

        if let Some(min) = self.min_properties {
            if map.len() < min {
                out.push(Violation::new(
                    path,
                    "minProperties",
                    format!("must NOT have fewer than {min} properties"),
                ));
            }
        }
        if let Some(max) = self.max_properties {
            if map.len() > max {
                out.push(Violation::new(
                    path,
                    "maxProperties",
                    format!("must NOT have more than {max} properties"),
                ));
            }
        }
    }

    fn check_array(
        &self,
        defs: &Definitions,
        items: &[Value],
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        match &self.items {
            Some(Items::Each(node)) => {
                for (index, item) in items.iter().enumerate() {
                    node.check(defs, item, &child_path(path, &index.to_string()), out);
                }
            }
            Some(Items::Tuple(nodes)) => {
                for (index, (item, node)) in items.iter().zip(nodes).enumerate() {
                    node.check(defs, item, &child_path(path, &index.to_string()), out);
                }
                if items.len() > nodes.len() {
                    match &self.additional_items {
                        Additional::Allow => {}
                        Additional::Deny => out.push(Violation::new(
                            path,
                            "additionalItems",
                            format!("must NOT have more than {} items", nodes.len()),
                        )),
                        Additional::Schema(node) => {
                            for (index, item) in items.iter().enumerate().skip(nodes.len()) {
                                node.check(defs, item, &child_path(path, &index.to_string()), out);
                            }
                        }
                    }
                }
            }
            None => {}
        }

        if let Some(min) = self.min_items {
            if items.len() < min {
                out.push(Violation::new(
                    path,
                    "minItems",
                    format!("must NOT have fewer than {min} items"),
                ));
            }
        }
        if let Some(max) = self.max_items {
            if items.len() > max {
                out.push(Violation::new(
                    path,
                    "maxItems",
                    format!("must NOT have more than {max} items"),
                ));
            }
        }

        if self.unique_items {
            let duplicate = (1..items.len()).find_map(|later| {
                (0..later)
                    .find(|&earlier| json_equal(&items[earlier], &items[later]))
                    .map(|earlier| (earlier, later))
            });
            if let Some((earlier, later)) = duplicate {
                out.push(Violation::new(
                    path,
                    "uniqueItems",
                    format!(
                        "must NOT have duplicate items (items ## {later} and {earlier} are identical)"
                    ),
                ));
            }
        }

        if let Some(node) = &self.contains {
            let matching = items.iter().filter(|item| node.is_valid(defs, item)).count();
            let min = self.min_contains.unwrap_or(1);
            if matching < min {
                out.push(Violation::new(
                    path,
                    "contains",
                    format!("must contain at least {min} valid item(s)"),
                ));
            }
            if let Some(max) = self.max_contains {
                if matching > max {
                    out.push(Violation::new(
                        path,
                        "contains",
                        format!("must contain at most {max} valid item(s)"),
                    ));
                }
            }
        }
    }

    fn check_string(&self, s: &str, path: &str, out: &mut Vec<Violation>) {
        let length = s.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                out.push(Violation::new(
                    path,
                    "minLength",
                    format!("must NOT have fewer than {min} characters"),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                out.push(Violation::new(
                    path,
                    "maxLength",
                    format!("must NOT have more than {max} characters"),
                ));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.regex.is_match(s) {
                out.push(Violation::new(
                    path,
                    "pattern",
                    format!("must match pattern \"{}\"", pattern.source),
                ));
            }
        }
        if let Some(format) = self.format {
            if !format.matches(s) {
                out.push(Violation::new(
                    path,
                    "format",
                    format!("must match format \"{}\"", format.as_str()),
                ));
            }
        }
    }

    fn check_number(&self, n: f64, path: &str, out: &mut Vec<Violation>) {
        let checks: [(&Option<Bound>, &str, &str, fn(f64, f64) -> bool); 4] = [
            (&self.minimum, "minimum", ">=", |n, b| n >= b),
            (&self.maximum, "maximum", "<=", |n, b| n <= b),
            (&self.exclusive_minimum, "exclusiveMinimum", ">", |n, b| n > b),
            (&self.exclusive_maximum, "exclusiveMaximum", "<", |n, b| n < b),
        ];
        for (bound, keyword, op, holds) in checks {
            if let Some(bound) = bound {
                if !holds(n, bound.value) {
                    out.push(Violation::new(
                        path,
                        keyword,
                        format!("must be {op} {}", bound.text),
                    ));
                }
            }
        }
        if let Some(divisor) = &self.multiple_of {
            if n % divisor.value != 0.0 {
                out.push(Violation::new(
                    path,
                    "multipleOf",
                    format!("must be multiple of {}", divisor.text),
                ));
            }
        }
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// Compiles one schema document; `at` is always a JSON pointer into `document`
struct Compiler<'doc, 'defs> {
    document: &'doc Value,
    definitions: &'defs mut Definitions,
    /// Pointer → definition index, per document
    slots: HashMap<String, usize>,
    pending: Vec<(usize, String)>,
}

impl<'doc> Compiler<'doc, '_> {
    fn node(&mut self, schema: &'doc Value, at: &str) -> Result<Node, SchemaError> {
        let map = match schema {
            Value::Bool(true) => return Ok(Node::default()),
            Value::Bool(false) => {
                return Ok(Node {
                    reject_all: true,
                    ..Node::default()
                });
            }
            Value::Object(map) => map,
            _ => return Err(SchemaError::new(at, "schema must be an object or a boolean")),
        };

        check_keywords(map, at)?;

        let mut node = Node::default();

        if let Some(reference) = map.get("$ref") {
            node.reference = Some(self.reference(reference, at)?);
        }

        for keyword in ["definitions", "$defs"] {
            if let Some(definitions) = map.get(keyword) {
                let loc = child_path(at, keyword);
                for name in as_object(definitions, &loc)?.keys() {
                    self.slot(&child_path(&loc, name));
                }
            }
        }

        if let Some(ty) = map.get("type") {
            node.types = Some(compile_types(ty, &child_path(at, "type"))?);
        }

        if let Some(properties) = map.get("properties") {
            let loc = child_path(at, "properties");
            for (name, sub) in as_object(properties, &loc)? {
                let sub = self.node(sub, &child_path(&loc, name))?;
                node.properties.push((name.clone(), sub));
            }
        }

        if let Some(patterns) = map.get("patternProperties") {
            let loc = child_path(at, "patternProperties");
            for (source, sub) in as_object(patterns, &loc)? {
                let entry = child_path(&loc, source);
                let pattern = compile_pattern(source, &entry)?;
                let sub = self.node(sub, &entry)?;
                node.pattern_properties.push((pattern, sub));
            }
        }

        if let Some(names) = map.get("propertyNames") {
            let sub = self.node(names, &child_path(at, "propertyNames"))?;
            node.property_names = Some(Box::new(sub));
        }

        if let Some(required) = map.get("required") {
            node.required = compile_names(required, &child_path(at, "required"))?;
        }

        if let Some(additional) = map.get("additionalProperties") {
            node.additional = self.additional(additional, &child_path(at, "additionalProperties"))?;
        }

        if let Some(dependent) = map.get("dependentRequired") {
            let loc = child_path(at, "dependentRequired");
            for (property, names) in as_object(dependent, &loc)? {
                node.dependent_required.push(Dependency {
                    keyword: "dependentRequired",
                    property: property.clone(),
                    required: compile_names(names, &child_path(&loc, property))?,
                });
            }
        }

        if let Some(dependent) = map.get("dependentSchemas") {
            let loc = child_path(at, "dependentSchemas");
            for (property, sub) in as_object(dependent, &loc)? {
                let sub = self.node(sub, &child_path(&loc, property))?;
                node.dependent_schemas.push((property.clone(), sub));
            }
        }

        // draft-07 form: array of names or a schema per property
        if let Some(dependencies) = map.get("dependencies") {
            let loc = child_path(at, "dependencies");
            for (property, dependency) in as_object(dependencies, &loc)? {
                let entry = child_path(&loc, property);
                if dependency.is_array() {
                    node.dependent_required.push(Dependency {
                        keyword: "dependencies",
                        property: property.clone(),
                        required: compile_names(dependency, &entry)?,
                    });
                } else {
                    let sub = self.node(dependency, &entry)?;
                    node.dependent_schemas.push((property.clone(), sub));
                }
            }
        }

        if let Some(items) = map.get("items") {
            let loc = child_path(at, "items");
            node.items = Some(match items {
                Value::Array(list) => Items::Tuple(self.list(list, &loc)?),
                single => Items::Each(Box::new(self.node(single, &loc)?)),
            });
        }

        if let Some(additional) = map.get("additionalItems") {
            node.additional_items = self.additional(additional, &child_path(at, "additionalItems"))?;
        }

        if let Some(contains) = map.get("contains") {
            node.contains = Some(Box::new(self.node(contains, &child_path(at, "contains"))?));
        }
        node.min_contains = compile_count(map, "minContains", at)?;
        node.max_contains = compile_count(map, "maxContains", at)?;

        node.unique_items = match map.get("uniqueItems") {
            None => false,
            Some(Value::Bool(unique)) => *unique,
            Some(_) => {
                return Err(SchemaError::new(
                    &child_path(at, "uniqueItems"),
                    "must be a boolean",
                ));
            }
        };

        if let Some(values) = map.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| SchemaError::new(&child_path(at, "enum"), "must be an array"))?;
            node.enumeration = Some(values.clone());
        }

        node.constant = map.get("const").cloned();

        node.min_length = compile_count(map, "minLength", at)?;
        node.max_length = compile_count(map, "maxLength", at)?;
        node.min_items = compile_count(map, "minItems", at)?;
        node.max_items = compile_count(map, "maxItems", at)?;
        node.min_properties = compile_count(map, "minProperties", at)?;
        node.max_properties = compile_count(map, "maxProperties", at)?;

        if let Some(pattern) = map.get("pattern") {
            let loc = child_path(at, "pattern");
            let source = pattern
                .as_str()
                .ok_or_else(|| SchemaError::new(&loc, "must be a string"))?;
            node.pattern = Some(compile_pattern(source, &loc)?);
        }

        if let Some(format) = map.get("format") {
            let loc = child_path(at, "format");
            let name = format
                .as_str()
                .ok_or_else(|| SchemaError::new(&loc, "must be a string"))?;
            node.format = Some(
                Format::parse(name)
                    .ok_or_else(|| SchemaError::new(&loc, format!("unknown format \"{name}\"")))?,
            );
        }

        node.minimum = compile_bound(map, "minimum", at)?;
        node.maximum = compile_bound(map, "maximum", at)?;
        node.exclusive_minimum = compile_bound(map, "exclusiveMinimum", at)?;
        node.exclusive_maximum = compile_bound(map, "exclusiveMaximum", at)?;
        node.multiple_of = compile_bound(map, "multipleOf", at)?;
        if node.multiple_of.as_ref().is_some_and(|divisor| divisor.value <= 0.0) {
            return Err(SchemaError::new(
                &child_path(at, "multipleOf"),
                "must be greater than 0",
            ));
        }

        node.all_of = self.keyword_list(map, "allOf", at)?;
        node.any_of = self.keyword_list(map, "anyOf", at)?;
        node.one_of = self.keyword_list(map, "oneOf", at)?;

        if let Some(not) = map.get("not") {
            node.not = Some(Box::new(self.node(not, &child_path(at, "not"))?));
        }

        match map.get("if") {
            Some(condition) => {
                let condition = self.node(condition, &child_path(at, "if"))?;
                let then = map
                    .get("then")
                    .map(|sub| self.node(sub, &child_path(at, "then")))
                    .transpose()?;
                let otherwise = map
                    .get("else")
                    .map(|sub| self.node(sub, &child_path(at, "else")))
                    .transpose()?;
                node.conditional = Some(Box::new(Conditional {
                    condition,
                    then,
                    otherwise,
                }));
            }
            None => {
                if let Some(keyword) = ["then", "else"].into_iter().find(|k| map.contains_key(*k)) {
                    return Err(SchemaError::new(
                        &child_path(at, keyword),
                        format!("\"{keyword}\" without \"if\" is ignored"),
                    ));
                }
            }
        }

        Ok(node)
    }

    fn additional(&mut self, value: &'doc Value, loc: &str) -> Result<Additional, SchemaError> {
        Ok(match value {
            Value::Bool(true) => Additional::Allow,
            Value::Bool(false) => Additional::Deny,
            other => Additional::Schema(Box::new(self.node(other, loc)?)),
        })
    }

    fn list(&mut self, list: &'doc [Value], loc: &str) -> Result<Vec<Node>, SchemaError> {
        list.iter()
            .enumerate()
            .map(|(index, sub)| self.node(sub, &child_path(loc, &index.to_string())))
            .collect()
    }

    fn keyword_list(
        &mut self,
        map: &'doc Map<String, Value>,
        keyword: &str,
        at: &str,
    ) -> Result<Vec<Node>, SchemaError> {
        let Some(list) = map.get(keyword) else {
            return Ok(Vec::new());
        };
        let loc = child_path(at, keyword);
        let list = list
            .as_array()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| SchemaError::new(&loc, "must be a non-empty array of schemas"))?;
        self.list(list, &loc)
    }

    /// Resolve a `$ref` to a definition index (compiled later)
    fn reference(&mut self, reference: &Value, at: &str) -> Result<usize, SchemaError> {
        let loc = child_path(at, "$ref");
        let raw = reference
            .as_str()
            .ok_or_else(|| SchemaError::new(&loc, "must be a string"))?;
        let pointer = raw.strip_prefix('#').ok_or_else(|| {
            SchemaError::new(&loc, format!("only local references are supported, got \"{raw}\""))
        })?;
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(SchemaError::new(
                &loc,
                format!("reference must be a JSON pointer fragment, got \"{raw}\""),
            ));
        }
        if self.document.pointer(pointer).is_none() {
            return Err(SchemaError::new(&loc, format!("unresolved reference \"{raw}\"")));
        }
        Ok(self.slot(pointer))
    }

    fn slot(&mut self, pointer: &str) -> usize {
        if let Some(&index) = self.slots.get(pointer) {
            return index;
        }
        let index = self.definitions.reserve(pointer);
        self.slots.insert(pointer.to_string(), index);
        self.pending.push((index, pointer.to_string()));
        index
    }

    fn resolve_pending(&mut self) -> Result<(), SchemaError> {
        let document = self.document;
        while let Some((index, pointer)) = self.pending.pop() {
            let target = document
                .pointer(&pointer)
                .ok_or_else(|| SchemaError::new(&pointer, "unresolved reference"))?;
            let node = self.node(target, &pointer)?;
            self.definitions.nodes[index] = node;
        }
        Ok(())
    }
}

fn check_keywords(map: &Map<String, Value>, at: &str) -> Result<(), SchemaError> {
    match map.keys().find(|key| {
        !VALIDATION_KEYWORDS.contains(&key.as_str()) && !ANNOTATION_KEYWORDS.contains(&key.as_str())
    }) {
        Some(key) => Err(SchemaError::new(
            &child_path(at, key),
            format!("unknown keyword \"{key}\""),
        )),
        None => Ok(()),
    }
}

fn as_object<'v>(value: &'v Value, loc: &str) -> Result<&'v Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(loc, "must be an object"))
}

fn compile_types(ty: &Value, loc: &str) -> Result<Vec<JsonType>, SchemaError> {
    let parse = |name: &Value| {
        let name = name
            .as_str()
            .ok_or_else(|| SchemaError::new(loc, "must be a string or an array of strings"))?;
        JsonType::parse(name).ok_or_else(|| SchemaError::new(loc, format!("unknown type \"{name}\"")))
    };
    match ty {
        Value::Array(names) if !names.is_empty() => names.iter().map(parse).collect(),
        Value::Array(_) => Err(SchemaError::new(loc, "must not be empty")),
        single => Ok(vec![parse(single)?]),
    }
}

fn compile_names(names: &Value, loc: &str) -> Result<Vec<String>, SchemaError> {
    let invalid = || SchemaError::new(loc, "must be an array of strings");
    names
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|name| name.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn compile_pattern(source: &str, loc: &str) -> Result<Pattern, SchemaError> {
    let regex = Regex::new(source)
        .map_err(|e| SchemaError::new(loc, format!("invalid regular expression: {e}")))?;
    Ok(Pattern {
        source: source.to_string(),
        regex,
    })
}

fn compile_count(
    map: &Map<String, Value>,
    keyword: &str,
    at: &str,
) -> Result<Option<usize>, SchemaError> {
    map.get(keyword)
        .map(|v| {
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    SchemaError::new(&child_path(at, keyword), "must be a non-negative integer")
                })
        })
        .transpose()
}

fn compile_bound(
    map: &Map<String, Value>,
    keyword: &str,
    at: &str,
) -> Result<Option<Bound>, SchemaError> {
    map.get(keyword)
        .map(|v| match v {
            Value::Number(n) => n
                .as_f64()
                .map(|value| Bound {
                    value,
                    text: n.to_string(),
                })
                .ok_or_else(|| SchemaError::new(&child_path(at, keyword), "must be a number")),
            _ => Err(SchemaError::new(&child_path(at, keyword), "must be a number")),
        })
        .transpose()
}
