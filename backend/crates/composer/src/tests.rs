//! Behavioural tests for the composer
//! Covers schema combination, layering order, immutability and error reporting.

#[cfg(test)]
mod fixtures {
    use crate::{Behavior, Record};
    use serde_json::{Value, json};

    pub fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture is not an object: {other}"),
        }
    }

    pub fn schema_a() -> Value {
        json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"}
            }
        })
    }

    pub fn schema_b() -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {"type": "string", "format": "email"}
            }
        })
    }

    pub fn base() -> Behavior {
        Behavior::base_type("Base")
            .with_initializer(|_, state| {
                state.insert("baseSet".into(), json!(true));
            })
            .with_operation("get_base_flag", |instance, _| {
                instance.get("baseSet").cloned().unwrap_or(Value::Null)
            })
    }

    pub fn timestamp() -> Behavior {
        Behavior::mixin("TimestampMixin")
            .with_initializer(|_, state| {
                state.insert("_createdAt".into(), json!(chrono::Utc::now().to_rfc3339()));
            })
            .with_operation("created_at", |instance, _| {
                instance.get("_createdAt").cloned().unwrap_or(Value::Null)
            })
    }

    pub fn returning(kind: fn(&str) -> Behavior, name: &str, value: &'static str) -> Behavior {
        kind(name).with_operation("m", move |_, _| json!(value))
    }
}

#[cfg(test)]
mod schema_combination_tests {
    use super::fixtures::*;
    use crate::{Composer, compose};
    use serde_json::json;

    #[test]
    fn test_no_schema_always_valid() {
        let dto = Composer::new("Open").build().unwrap();
        let samples = [
            json!({}),
            json!({"foo": 1}),
            json!({"id": 42, "nested": {"deep": [1, 2, 3]}}),
        ];
        for sample in samples {
            assert!(dto.validate(&record(sample)));
        }
        assert!(dto.last_errors().is_empty());
    }

    #[test]
    fn test_single_schema_passes_through() {
        let dto = compose("A", vec![schema_a().into()]).unwrap();
        let validator = crate::Validator::compile(schema_a()).unwrap();
        let samples = [
            json!({"id": "abc"}),
            json!({"id": 1}),
            json!({"name": "No ID"}),
            json!({"id": "x", "name": 5}),
            json!({"id": "x", "extra": true}),
        ];
        for sample in samples {
            assert_eq!(dto.validate(&record(sample.clone())), validator.is_valid(&sample));
        }
        assert_eq!(dto.schema(), Some(&schema_a()));
    }

    #[test]
    fn test_multiple_schemas_are_anded() {
        let dto = compose("AB", vec![schema_a().into(), schema_b().into()]).unwrap();

        // satisfies A, violates B
        assert!(!dto.validate(&record(json!({"id": "123", "email": "bad"}))));
        // satisfies B, violates A
        assert!(!dto.validate(&record(json!({"email": "ok@example.com"}))));
        assert!(dto.validate(&record(json!({"id": "123", "email": "ok@example.com"}))));
        assert_eq!(dto.schema(), Some(&json!({"allOf": [schema_a(), schema_b()]})));
    }

    #[test]
    fn test_static_validate_records_errors() {
        let dto = compose("AB", vec![schema_a().into(), schema_b().into()]).unwrap();
        assert!(!dto.validate(&record(json!({"id": "x", "email": "bad"}))));
        let errors = dto.last_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), "/email");
        assert_eq!(errors[0].keyword(), "format");
    }
}

#[cfg(test)]
mod layering_tests {
    use super::fixtures::*;
    use crate::{Behavior, compose};
    use serde_json::json;

    #[test]
    fn test_later_extension_wins() {
        let b = || returning(Behavior::base_type, "B", "base");
        let e1 = || returning(Behavior::mixin, "E1", "e1");
        let e2 = || returning(Behavior::mixin, "E2", "e2");

        let dto = compose("BE1E2", vec![b().into(), e1().into(), e2().into()]).unwrap();
        let instance = dto.construct(record(json!({}))).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), json!("e2"));

        let dto = compose("BE2E1", vec![b().into(), e2().into(), e1().into()]).unwrap();
        let instance = dto.construct(record(json!({}))).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), json!("e1"));
    }

    #[test]
    fn test_base_alone_provides_operation() {
        let dto = compose("B", vec![returning(Behavior::base_type, "B", "base").into()]).unwrap();
        let instance = dto.construct(record(json!({}))).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), json!("base"));
    }

    #[test]
    fn test_mixin_before_base_still_overrides_base() {
        // (E1, B): base is innermost regardless of position
        let dto = compose(
            "E1B",
            vec![
                returning(Behavior::mixin, "E1", "e1").into(),
                returning(Behavior::base_type, "B", "base").into(),
            ],
        )
        .unwrap();
        assert_eq!(dto.base(), Some("B"));
        let instance = dto.construct(record(json!({}))).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), json!("e1"));
        assert_eq!(dto.operation_origin("m"), Some("E1"));
    }

    #[test]
    fn test_second_type_becomes_extension() {
        let dto = compose(
            "B1B2",
            vec![
                returning(Behavior::base_type, "B1", "b1").into(),
                returning(Behavior::base_type, "B2", "b2").into(),
            ],
        )
        .unwrap();
        assert_eq!(dto.base(), Some("B1"));
        assert_eq!(dto.extensions().collect::<Vec<_>>(), ["B2"]);
        let instance = dto.construct(record(json!({}))).unwrap();
        assert_eq!(instance.call("m", &[]).unwrap(), json!("b2"));
    }

    #[test]
    fn test_inherits_from_base() {
        let dto = compose("A", vec![base().into(), schema_a().into()]).unwrap();
        let a = dto.construct(record(json!({"id": "1"}))).unwrap();
        assert_eq!(a.call("get_base_flag", &[]).unwrap(), json!(true));
    }

    #[test]
    fn test_applies_mixins() {
        let dto = compose("A", vec![base().into(), timestamp().into(), schema_a().into()]).unwrap();
        let a = dto.construct(record(json!({"id": "x"}))).unwrap();
        assert!(a.call("created_at", &[]).unwrap().is_string());
        assert_eq!(a.call("get_base_flag", &[]).unwrap(), json!(true));
    }

    #[test]
    fn test_only_mixins_without_schemas() {
        let dto = compose("A", vec![timestamp().into()]).unwrap();
        assert!(dto.base().is_none());
        let a = dto.construct(record(json!({"x": 1}))).unwrap();
        assert_eq!(a.field("x"), Some(&json!(1)));
        assert!(a.call("created_at", &[]).unwrap().is_string());
    }
}

#[cfg(test)]
mod instance_tests {
    use super::fixtures::*;
    use crate::{Composer, compose};
    use serde_json::json;

    #[test]
    fn test_field_fidelity() {
        let dto = compose("A", vec![base().into(), schema_a().into()]).unwrap();
        let data = record(json!({"id": "123", "name": "John", "extra": [1, {"k": null}]}));
        let a = dto.construct(data.clone()).unwrap();
        assert_eq!(a.fields(), &data);
        for (key, value) in &data {
            assert_eq!(a.field(key), Some(value));
        }
        // initialization state is not a data field
        assert!(a.field("baseSet").is_none());
    }

    #[test]
    fn test_no_args_fallback() {
        let dto = Composer::new("Empty").build().unwrap();
        let a = dto.construct(record(json!({"foo": 1}))).unwrap();
        assert_eq!(a.field("foo"), Some(&json!(1)));
        assert_eq!(a.type_name(), "Empty");
    }

    #[test]
    fn test_instances_are_snapshots() {
        let dto = compose("A", vec![schema_a().into()]).unwrap();
        let mut data = record(json!({"id": "freeze"}));
        let a = dto.construct(data.clone()).unwrap();

        // changing the caller's record does not reach the instance
        data.insert("id".into(), json!("changed"));
        assert_eq!(a.field("id"), Some(&json!("freeze")));

        // a clone is an equal, independent value
        let b = a.clone();
        assert_eq!(a, b);

        // "mutation" means building another instance; the original is untouched
        let mut next = a.fields().clone();
        next.insert("name".into(), json!("renamed"));
        let c = dto.construct(next).unwrap();
        assert!(a.field("name").is_none());
        assert_eq!(c.field("name"), Some(&json!("renamed")));
    }

    #[test]
    fn test_serializes_data_fields_only() {
        let dto = compose("A", vec![base().into(), schema_a().into()]).unwrap();
        let a = dto.construct(record(json!({"id": "1", "name": "Ann"}))).unwrap();
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json, json!({"id": "1", "name": "Ann"}));
        assert_eq!(a.to_value(), json);
    }
}

#[cfg(test)]
mod error_reporting_tests {
    use super::fixtures::*;
    use crate::{ComposeError, compose};
    use kernel::AppError;
    use serde_json::json;

    #[test]
    fn test_throws_on_invalid_data() {
        let dto = compose("A", vec![schema_a().into()]).unwrap();
        let data = record(json!({"name": "No ID"}));

        let err = dto.construct(data.clone()).unwrap_err();
        assert!(err.to_string().starts_with("DTO validation failed"));
        assert_eq!(err.violations()[0].path(), "/id");
        assert_eq!(err.violations()[0].keyword(), "required");

        assert!(!dto.validate(&data));
        assert!(!dto.last_errors().is_empty());
    }

    #[test]
    fn test_end_to_end_user_schema() {
        let schema = json!({
            "required": ["id"],
            "properties": {
                "id": {"type": "string"},
                "email": {"type": "string", "format": "email"}
            }
        });
        let dto = compose("UserDto", vec![schema.into()]).unwrap();

        let err = dto.construct(record(json!({"id": "1", "email": "bad"}))).unwrap_err();
        assert_eq!(err.summary(), "data/email must match format \"email\"");

        let user = dto
            .construct(record(json!({"id": "1", "email": "ok@example.com"})))
            .unwrap();
        assert_eq!(user.field("email"), Some(&json!("ok@example.com")));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let dto = compose("AB", vec![schema_a().into(), schema_b().into()]).unwrap();
        let err = dto
            .construct(record(json!({"name": 7, "email": "nope"})))
            .unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.path()).collect();
        assert_eq!(paths, ["/id", "/name", "/email"]);
    }

    #[test]
    fn test_invalid_argument_is_fatal() {
        let err = compose("Bad", vec![schema_a().into(), json!("not a schema").into()]).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::InvalidArgument { position: 1, ref kind } if kind == "string"
        ));
        let app: AppError = err.into();
        assert!(app.is_server_error());
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let dto = compose("A", vec![schema_a().into()]).unwrap();
        let err = dto.construct(record(json!({}))).unwrap_err();
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.details(), ["data/id is a required property".to_string()]);
    }
}

#[cfg(test)]
mod keyword_enforcement_tests {
    use super::fixtures::*;
    use crate::{ComposeError, DerivedType, compose};
    use serde_json::{Value, json};

    fn single(schema: Value) -> DerivedType {
        compose("Checked", vec![schema.into()]).unwrap()
    }

    /// (schema, accepted record, rejected record, keyword reported)
    fn cases() -> Vec<(Value, Value, Value, &'static str)> {
        vec![
            (
                json!({"properties": {"n": {"type": "integer", "multipleOf": 2}}}),
                json!({"n": 4}),
                json!({"n": 3}),
                "multipleOf",
            ),
            (
                json!({"properties": {"tags": {"type": "array", "uniqueItems": true}}}),
                json!({"tags": [1, 2]}),
                json!({"tags": [1, 1]}),
                "uniqueItems",
            ),
            (
                json!({"type": "object", "patternProperties": {"^x": {"type": "string"}}}),
                json!({"xa": "ok"}),
                json!({"xa": 1}),
                "type",
            ),
            (
                json!({
                    "definitions": {"name": {"type": "string"}},
                    "properties": {"id": {"$ref": "#/definitions/name"}}
                }),
                json!({"id": "5"}),
                json!({"id": 5}),
                "type",
            ),
            (
                json!({"type": "object", "dependentRequired": {"a": ["b"]}}),
                json!({"a": 1, "b": 2}),
                json!({"a": 1}),
                "dependentRequired",
            ),
            (
                json!({
                    "type": "object",
                    "if": {"required": ["admin"]},
                    "then": {"required": ["level"]},
                    "else": {"properties": {"level": false}}
                }),
                json!({"admin": true, "level": 1}),
                json!({"admin": true}),
                "required",
            ),
            (
                json!({"properties": {"roles": {"contains": {"const": "owner"}}}}),
                json!({"roles": ["owner", "guest"]}),
                json!({"roles": ["guest"]}),
                "contains",
            ),
            (
                json!({"type": "object", "propertyNames": {"pattern": "^[a-z]+$"}}),
                json!({"name": 1}),
                json!({"Name": 1}),
                "propertyNames",
            ),
        ]
    }

    #[test]
    fn test_standard_keywords_are_enforced() {
        for (schema, good, bad, keyword) in cases() {
            let dto = single(schema.clone());
            assert!(dto.validate(&record(good)), "{schema} should accept its valid record");
            assert!(!dto.validate(&record(bad.clone())), "{schema} accepted {bad}");
            assert_eq!(dto.last_errors()[0].keyword(), keyword, "{schema}");
        }
    }

    #[test]
    fn test_enum_matches_numerically_equal_values() {
        let dto = single(json!({"properties": {"n": {"enum": [1, 2]}}}));
        assert!(dto.validate(&record(json!({"n": 1.0}))));
        assert!(!dto.validate(&record(json!({"n": 1.5}))));
    }

    #[test]
    fn test_unenforced_keyword_fails_composition() {
        let err = compose(
            "Strict",
            vec![
                base().into(),
                json!({"type": "object", "properties": {"id": {"type": "string", "minLenght": 1}}})
                    .into(),
            ],
        )
        .unwrap_err();
        match err {
            ComposeError::InvalidSchema { position, reason } => {
                assert_eq!(position, 1);
                assert!(reason.contains("minLenght"));
            }
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_external_reference_fails_composition() {
        let err = compose(
            "Remote",
            vec![json!({"properties": {"id": {"$ref": "https://example.com/id.json"}}}).into()],
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidSchema { position: 0, .. }));
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::fixtures::*;
    use crate::{DerivedType, Instance, compose};
    use serde_json::json;
    use std::thread;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_handles_are_thread_safe() {
        assert_send_sync::<DerivedType>();
        assert_send_sync::<Instance>();
    }

    #[test]
    fn test_check_is_race_free() {
        let dto = compose("A", vec![schema_a().into()]).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dto = dto.clone();
                thread::spawn(move || {
                    let data = if i % 2 == 0 {
                        record(json!({"id": format!("user-{i}")}))
                    } else {
                        record(json!({"name": "missing id"}))
                    };
                    (i, dto.check(&data).is_ok())
                })
            })
            .collect();

        for handle in handles {
            let (i, ok) = handle.join().unwrap();
            assert_eq!(ok, i % 2 == 0);
        }
    }
}
