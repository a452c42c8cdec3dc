//! Field coercion rules

use docmap::domain::fields::binary_bytes;
use docmap::{DocError, FieldType};
use serde_json::{json, Value};

fn coerce(kind: FieldType, value: Value) -> Result<Value, DocError> {
    kind.coerce("field", value)
}

#[test]
fn test_null_is_accepted_by_every_type() {
    for kind in [
        FieldType::String,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Boolean,
        FieldType::Binary,
        FieldType::Time,
        FieldType::Array,
        FieldType::Hash,
        FieldType::Any,
    ] {
        assert_eq!(coerce(kind, Value::Null).unwrap(), Value::Null);
    }
}

#[test]
fn test_string_coercion() {
    assert_eq!(coerce(FieldType::String, json!("x")).unwrap(), json!("x"));
    assert_eq!(coerce(FieldType::String, json!(42)).unwrap(), json!("42"));
    assert_eq!(coerce(FieldType::String, json!(true)).unwrap(), json!("true"));
    assert!(coerce(FieldType::String, json!(["x"])).is_err());
}

#[test]
fn test_integer_coercion() {
    assert_eq!(coerce(FieldType::Integer, json!(7)).unwrap(), json!(7));
    assert_eq!(coerce(FieldType::Integer, json!(7.0)).unwrap(), json!(7));
    assert_eq!(coerce(FieldType::Integer, json!(" 12 ")).unwrap(), json!(12));
    assert!(coerce(FieldType::Integer, json!(7.5)).is_err());
    assert!(coerce(FieldType::Integer, json!("seven")).is_err());
    assert!(coerce(FieldType::Integer, json!(true)).is_err());
}

#[test]
fn test_float_coercion() {
    assert_eq!(coerce(FieldType::Float, json!(1.5)).unwrap(), json!(1.5));
    assert_eq!(coerce(FieldType::Float, json!("2.25")).unwrap(), json!(2.25));
    assert_eq!(coerce(FieldType::Float, json!(3)).unwrap(), json!(3.0));
    assert!(coerce(FieldType::Float, json!("NaN-ish")).is_err());
}

#[test]
fn test_boolean_coercion() {
    assert_eq!(coerce(FieldType::Boolean, json!("yes")).unwrap(), json!(true));
    assert_eq!(coerce(FieldType::Boolean, json!("0")).unwrap(), json!(false));
    assert_eq!(coerce(FieldType::Boolean, json!(1)).unwrap(), json!(true));
    assert!(coerce(FieldType::Boolean, json!(2)).is_err());
    assert!(coerce(FieldType::Boolean, json!("maybe")).is_err());
}

#[test]
fn test_binary_follows_declared_type() {
    let from_bytes = coerce(FieldType::Binary, json!([0, 255, 16])).unwrap();
    assert_eq!(from_bytes, json!({"$binary": "00ff10"}));
    assert_eq!(binary_bytes(&from_bytes), Some(vec![0, 255, 16]));

    let from_string = coerce(FieldType::Binary, json!("hi")).unwrap();
    assert_eq!(binary_bytes(&from_string), Some(b"hi".to_vec()));

    // Already tagged values are kept
    assert_eq!(
        coerce(FieldType::Binary, json!({"$binary": "abcd"})).unwrap(),
        json!({"$binary": "abcd"})
    );

    // The same string stays a string on a string field
    assert_eq!(coerce(FieldType::String, json!("hi")).unwrap(), json!("hi"));

    assert!(coerce(FieldType::Binary, json!([256])).is_err());
    assert!(coerce(FieldType::Binary, json!({"$binary": "zz"})).is_err());
}

#[test]
fn test_time_coercion() {
    assert_eq!(
        coerce(FieldType::Time, json!("2024-03-01T10:00:00+02:00")).unwrap(),
        json!("2024-03-01T08:00:00.000Z")
    );
    assert_eq!(
        coerce(FieldType::Time, json!(0)).unwrap(),
        json!("1970-01-01T00:00:00.000Z")
    );
    assert!(coerce(FieldType::Time, json!("yesterday")).is_err());
}

#[test]
fn test_container_types() {
    assert!(coerce(FieldType::Array, json!([1, 2])).is_ok());
    assert!(coerce(FieldType::Array, json!(1)).is_err());
    assert!(coerce(FieldType::Hash, json!({"a": 1})).is_ok());
    assert!(coerce(FieldType::Hash, json!([1])).is_err());
    assert_eq!(coerce(FieldType::Any, json!([1, {"a": 2}])).unwrap(), json!([1, {"a": 2}]));
}

#[test]
fn test_invalid_value_error_names_field() {
    let err = FieldType::Integer.coerce("age", json!("old")).unwrap_err();
    match err {
        DocError::InvalidValue { field, expected, .. } => {
            assert_eq!(field, "age");
            assert_eq!(expected, "integer");
        }
        other => panic!("unexpected error: {}", other),
    }
}
