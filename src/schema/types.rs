//! # Field Types
//!
//! The closed set of supported field types and their casters.
//!
//! Each type owns a caster: a total function from an application value to
//! the store's representable form. Casters never fail; anything a caster
//! cannot interpret collapses to the type's zero value. Failures are the
//! job of validators, which run after casting.
//!
//! Stored representations:
//! - `Number` — JSON number
//! - `String` — JSON string (must be non-empty, the store rejects `""`)
//! - `Boolean` — JSON number `0`/`1`, read back through a getter
//! - `Date` — UTC epoch milliseconds, read back through a getter
//! - `Object` — JSON-serialized string, read back through a getter
//! - array variants — element-wise over a sequence-coerced input

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::field::FieldType;
use super::spec::FieldSpec;

/// The supported field types.
///
/// A closed enum resolved once at schema-construction time; per-value
/// dispatch is a match, not a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Boolean,
    Date,
    DateArray,
    Number,
    NumberArray,
    String,
    StringArray,
    Object,
}

impl TypeName {
    /// Returns the type name for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Boolean => "Boolean",
            TypeName::Date => "Date",
            TypeName::DateArray => "DateArray",
            TypeName::Number => "Number",
            TypeName::NumberArray => "NumberArray",
            TypeName::String => "String",
            TypeName::StringArray => "StringArray",
            TypeName::Object => "Object",
        }
    }

    /// Resolves a declared type name, failing with `UnsupportedType` for
    /// anything outside the supported set.
    pub fn parse(field: &str, name: &str) -> SchemaResult<Self> {
        match name {
            "Boolean" => Ok(TypeName::Boolean),
            "Date" => Ok(TypeName::Date),
            "DateArray" => Ok(TypeName::DateArray),
            "Number" => Ok(TypeName::Number),
            "NumberArray" => Ok(TypeName::NumberArray),
            "String" => Ok(TypeName::String),
            "StringArray" => Ok(TypeName::StringArray),
            "Object" => Ok(TypeName::Object),
            other => Err(SchemaError::UnsupportedType {
                field: field.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    /// Whether this is one of the array variants
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            TypeName::DateArray | TypeName::NumberArray | TypeName::StringArray
        )
    }

    /// Casts a value to this type's stored representation. Total: never fails.
    pub(crate) fn cast(&self, value: &Value) -> Value {
        match self {
            TypeName::Boolean => cast_boolean(value),
            TypeName::Date => cast_date(value),
            TypeName::DateArray => cast_sequence(value, cast_date),
            TypeName::Number => cast_number(value),
            TypeName::NumberArray => cast_sequence(value, cast_number),
            TypeName::String => cast_string(value),
            TypeName::StringArray => cast_sequence(value, cast_string),
            TypeName::Object => cast_object(value),
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registers the validators, setters, and getters a type carries by
/// construction, plus those implied by the field's declared options.
///
/// Runs after any caller-supplied setters/getters/validators, so custom
/// pipeline entries execute first.
pub(crate) fn apply_type_options(field: &mut FieldType, spec: &FieldSpec) {
    match field.type_name() {
        TypeName::Boolean => {
            // stored as 0/1; read back as a real boolean
            field.get(|v| get_boolean(&v));
        }
        TypeName::Date => {
            field.get(|v| get_date(&v));
        }
        TypeName::DateArray => {
            field.get(|v| map_elements(&v, get_date));
        }
        TypeName::Number => {
            if let Some(minimum) = spec.min {
                field.validate(
                    move |v| v.as_f64().is_some_and(|n| n >= minimum),
                    "min",
                );
            }
            if let Some(maximum) = spec.max {
                field.validate(
                    move |v| v.as_f64().is_some_and(|n| n <= maximum),
                    "max",
                );
            }
        }
        TypeName::NumberArray => {}
        TypeName::String => {
            // the store rejects empty strings
            field.validate(|v| v.as_str().is_some_and(|s| !s.is_empty()), "empty string");

            if let Some(values) = spec.enum_values.clone() {
                field.validate(
                    move |v| v.as_str().is_some_and(|s| values.iter().any(|e| e == s)),
                    "enum",
                );
            }
            if spec.lowercase {
                field.set(|v| transform_string(v, |s| s.to_lowercase()));
            }
            if spec.uppercase {
                field.set(|v| transform_string(v, |s| s.to_uppercase()));
            }
        }
        TypeName::StringArray => {}
        TypeName::Object => {
            field.get(|v| get_object(&v));
        }
    }
}

// ==================
// Casters
// ==================

/// Numeric coercion: numbers pass through, booleans become 0/1, numeric
/// strings parse, everything else collapses to 0.
pub(crate) fn cast_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::Bool(b) => Value::from(i64::from(*b)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = trimmed.parse::<f64>() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::from(0))
            } else {
                Value::from(0)
            }
        }
        _ => Value::from(0),
    }
}

/// String coercion: strings pass through, everything else renders as its
/// compact JSON form.
pub(crate) fn cast_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

/// Booleans are stored numerically (0/1); non-boolean input goes through
/// numeric coercion unchanged.
pub(crate) fn cast_boolean(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(i64::from(*b)),
        other => cast_number(other),
    }
}

/// Dates are stored as UTC epoch milliseconds. Accepts an RFC 3339 string
/// or an epoch-milliseconds number; unparseable input collapses to 0.
pub(crate) fn cast_date(value: &Value) -> Value {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0);
            Value::from(millis)
        }
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                Value::from(dt.timestamp_millis())
            } else if let Ok(millis) = s.trim().parse::<i64>() {
                Value::from(millis)
            } else {
                Value::from(0)
            }
        }
        _ => Value::from(0),
    }
}

/// Objects are stored as their JSON-serialized string form.
pub(crate) fn cast_object(value: &Value) -> Value {
    Value::String(value.to_string())
}

/// Coerces the input to a sequence, then maps the scalar caster over it.
/// A non-array input is treated as a single-element sequence; null casts
/// to an empty one.
pub(crate) fn cast_sequence(value: &Value, scalar: fn(&Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(scalar).collect()),
        Value::Null => Value::Array(Vec::new()),
        single => Value::Array(vec![scalar(single)]),
    }
}

// ==================
// Built-in getters
// ==================

fn get_boolean(stored: &Value) -> Value {
    match stored {
        Value::Bool(_) => stored.clone(),
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        _ => Value::Bool(false),
    }
}

fn get_date(stored: &Value) -> Value {
    match stored.as_i64().and_then(DateTime::from_timestamp_millis) {
        Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => stored.clone(),
    }
}

fn get_object(stored: &Value) -> Value {
    match stored {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| stored.clone()),
        other => other.clone(),
    }
}

fn map_elements(stored: &Value, getter: fn(&Value) -> Value) -> Value {
    match stored {
        Value::Array(items) => Value::Array(items.iter().map(getter).collect()),
        other => getter(other),
    }
}

fn transform_string(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_cast_is_total() {
        assert_eq!(cast_number(&json!(42)), json!(42));
        assert_eq!(cast_number(&json!(1.5)), json!(1.5));
        assert_eq!(cast_number(&json!(true)), json!(1));
        assert_eq!(cast_number(&json!("17")), json!(17));
        assert_eq!(cast_number(&json!("2.5")), json!(2.5));
        assert_eq!(cast_number(&json!("not a number")), json!(0));
        assert_eq!(cast_number(&json!(null)), json!(0));
        assert_eq!(cast_number(&json!({"a": 1})), json!(0));
    }

    #[test]
    fn test_string_cast_is_total() {
        assert_eq!(cast_string(&json!("hi")), json!("hi"));
        assert_eq!(cast_string(&json!(42)), json!("42"));
        assert_eq!(cast_string(&json!(true)), json!("true"));
        assert_eq!(cast_string(&json!(null)), json!("null"));
    }

    #[test]
    fn test_boolean_cast_stores_numbers() {
        assert_eq!(cast_boolean(&json!(true)), json!(1));
        assert_eq!(cast_boolean(&json!(false)), json!(0));
        assert_eq!(cast_boolean(&json!(5)), json!(5));
        // non-boolean input is numeric coercion, not truthiness
        assert_eq!(cast_boolean(&json!("abc")), json!(0));
        assert_eq!(cast_boolean(&json!("1")), json!(1));
    }

    #[test]
    fn test_date_cast_rfc3339_to_epoch_millis() {
        let cast = cast_date(&json!("1970-01-01T00:00:01Z"));
        assert_eq!(cast, json!(1000));

        // epoch numbers pass through
        assert_eq!(cast_date(&json!(1000)), json!(1000));
        // garbage collapses to zero, never errors
        assert_eq!(cast_date(&json!("yesterday")), json!(0));
    }

    #[test]
    fn test_date_getter_round_trips_the_instant() {
        let stored = cast_date(&json!("2020-06-01T12:00:00.000Z"));
        let back = get_date(&stored);
        assert_eq!(back, json!("2020-06-01T12:00:00.000Z"));
    }

    #[test]
    fn test_object_cast_serializes_and_getter_parses() {
        let original = json!({"nested": {"a": 1}, "b": [1, 2]});
        let stored = cast_object(&original);
        assert!(stored.is_string());
        assert_eq!(get_object(&stored), original);
    }

    #[test]
    fn test_sequence_coercion_wraps_non_arrays() {
        // maybe they just forgot the array wrapper, be permissive
        assert_eq!(cast_sequence(&json!("solo"), cast_string), json!(["solo"]));
        assert_eq!(
            cast_sequence(&json!(["a", 2]), cast_string),
            json!(["a", "2"])
        );
        assert_eq!(cast_sequence(&json!(null), cast_number), json!([]));
    }

    #[test]
    fn test_unsupported_type_name() {
        let err = TypeName::parse("color", "Rainbow").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { .. }));
        assert_eq!(err.field(), "color");
    }

    #[test]
    fn test_type_name_round_trip() {
        for name in [
            "Boolean",
            "Date",
            "DateArray",
            "Number",
            "NumberArray",
            "String",
            "StringArray",
            "Object",
        ] {
            let parsed = TypeName::parse("f", name).unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }
}
