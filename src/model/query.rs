//! # Query Routing
//!
//! Decides whether a query runs against the primary key or a secondary
//! index, and casts condition values on the way through.
//!
//! Any condition field that is neither the hash key nor the range key is
//! treated as referencing its derived secondary index, named by the fixed
//! `<field>-index` rule that table creation uses as well. Comparison
//! objects (e.g. `{"GT": 10}`) keep their operator keys; only the inner
//! value(s) are cast. An object is a comparison only when it carries a
//! single known operator key; any other object is a plain value for the
//! field's caster.

use serde_json::Value;

use crate::schema::{FieldType, Item, Schema, SchemaError};
use crate::store::QueryOptions;

use super::errors::ModelResult;

/// The fixed index-naming rule shared by query routing and table creation
pub(crate) fn index_name(field: &str) -> String {
    format!("{}-index", field)
}

/// The store's comparison vocabulary
const OPERATORS: [&str; 8] = [
    "EQ",
    "NE",
    "LT",
    "LE",
    "GT",
    "GE",
    "BETWEEN",
    "BEGINS_WITH",
];

/// Casts the conditions for the store and selects the index to query.
///
/// Every condition field must be declared. The first non-key field (in
/// deterministic map order) selects `index_name`, unless the caller
/// already chose one explicitly.
pub(crate) fn route(
    schema: &Schema,
    hash_field: &str,
    range_field: Option<&str>,
    conditions: &Item,
    options: &mut QueryOptions,
) -> ModelResult<Item> {
    let mut cast = Item::new();
    for (name, condition) in conditions {
        let field = schema
            .field(name)
            .ok_or_else(|| SchemaError::UndeclaredField { field: name.clone() })?;

        let is_key = name == hash_field || range_field == Some(name.as_str());
        if !is_key && options.index_name.is_none() {
            options.index_name = Some(index_name(name));
        }

        cast.insert(name.clone(), cast_condition(field, condition));
    }
    Ok(cast)
}

/// Casts a condition value: comparison objects on their inner value(s)
/// only, operator keys preserved; everything else (including plain object
/// values, e.g. equality on an Object-typed field) goes through the
/// field's caster directly.
fn cast_condition(field: &FieldType, condition: &Value) -> Value {
    match condition.as_object() {
        Some(comparison) if is_comparison(comparison) => {
            let mut out = serde_json::Map::new();
            for (operator, operand) in comparison {
                let cast = match operand {
                    Value::Array(bounds) => {
                        Value::Array(bounds.iter().map(|v| field.cast(v)).collect())
                    }
                    single => field.cast(single),
                };
                out.insert(operator.clone(), cast);
            }
            Value::Object(out)
        }
        _ => field.cast(condition),
    }
}

fn is_comparison(map: &serde_json::Map<String, Value>) -> bool {
    map.len() == 1 && map.keys().all(|k| OPERATORS.contains(&k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .field("id", FieldSpec::string().required())
            .field("ts", FieldSpec::number().required())
            .field("priority", FieldSpec::number().index())
            .field("meta", FieldSpec::object().index())
            .build()
            .unwrap()
    }

    fn to_item(value: Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_key_only_conditions_use_primary_key() {
        let mut options = QueryOptions::default();
        let cast = route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "ts": {"GT": "5"}})),
            &mut options,
        )
        .unwrap();

        assert_eq!(options.index_name, None);
        // inner value cast, operator preserved
        assert_eq!(cast["ts"], json!({"GT": 5}));
    }

    #[test]
    fn test_non_key_condition_selects_derived_index() {
        let mut options = QueryOptions::default();
        route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "priority": {"GT": 5}})),
            &mut options,
        )
        .unwrap();

        assert_eq!(options.index_name.as_deref(), Some("priority-index"));
    }

    #[test]
    fn test_explicit_index_name_is_kept() {
        let mut options = QueryOptions {
            index_name: Some("custom-index".into()),
            ..QueryOptions::default()
        };
        route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "priority": 1})),
            &mut options,
        )
        .unwrap();

        assert_eq!(options.index_name.as_deref(), Some("custom-index"));
    }

    #[test]
    fn test_between_bounds_cast_element_wise() {
        let mut options = QueryOptions::default();
        let cast = route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "ts": {"BETWEEN": ["1", "9"]}})),
            &mut options,
        )
        .unwrap();

        assert_eq!(cast["ts"], json!({"BETWEEN": [1, 9]}));
    }

    /// A plain object value is an equality condition, not a comparison:
    /// its keys must not be misread as operators.
    #[test]
    fn test_plain_object_condition_casts_as_a_value() {
        let mut options = QueryOptions::default();
        let cast = route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "meta": {"tag": "x"}})),
            &mut options,
        )
        .unwrap();

        // the Object caster serializes it; no operator object survives
        assert_eq!(cast["meta"], json!(r#"{"tag":"x"}"#));
        assert_eq!(options.index_name.as_deref(), Some("meta-index"));
    }

    /// Multi-key objects are never comparisons, even when one key matches
    /// an operator name.
    #[test]
    fn test_multi_key_object_condition_is_not_a_comparison() {
        let mut options = QueryOptions::default();
        let cast = route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"id": "a", "meta": {"GT": 1, "tag": "x"}})),
            &mut options,
        )
        .unwrap();

        assert!(cast["meta"].is_string());
    }

    #[test]
    fn test_undeclared_condition_field_rejected() {
        let mut options = QueryOptions::default();
        let err = route(
            &schema(),
            "id",
            Some("ts"),
            &to_item(json!({"ghost": 1})),
            &mut options,
        )
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::UndeclaredField {
                field: "ghost".into()
            }
            .into()
        );
    }
}
