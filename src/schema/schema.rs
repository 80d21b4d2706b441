//! # Schema
//!
//! An ordered mapping from field name to [`FieldType`], with the derived
//! `required`/`unique`/`indexes` name lists, and the two whole-document
//! operations:
//!
//! - `prepare`: setters + cast + validation on the way in
//! - `present`: getters on the way out
//!
//! Referencing an attribute the schema does not declare is a hard error in
//! both directions, never a silent drop.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::field::FieldType;
use super::spec::FieldSpec;

/// A flat attribute map, the document shape exchanged with the store.
///
/// `serde_json::Map` iterates in sorted key order, so every walk over a
/// document is deterministic.
pub type Item = serde_json::Map<String, Value>;

/// An immutable, ordered collection of field types.
pub struct Schema {
    paths: HashMap<String, FieldType>,
    order: Vec<String>,
    required: Vec<String>,
    unique: Vec<String>,
    indexes: Vec<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Looks up a declared field
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.paths.get(name)
    }

    /// Declared field names, in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Fields that must be present at prepare time, declaration order
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Fields flagged unique (advisory), declaration order
    pub fn unique(&self) -> &[String] {
        &self.unique
    }

    /// Fields flagged as secondary-index-queryable, declaration order
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    /// Forces a field into the required list. Used by the model layer for
    /// key fields; the field must already be declared.
    pub(crate) fn force_required(&mut self, name: &str) {
        if let Some(field) = self.paths.get_mut(name) {
            field.mark_required();
            if !self.required.iter().any(|r| r == name) {
                self.required.push(name.to_string());
            }
        }
    }

    /// Prepares a document for persistence.
    ///
    /// Asserts every required field is present (non-null), then replaces
    /// every present field's value with its `prep` result. Fields absent
    /// and not required are untouched; defaults are a document-construction
    /// concern, not a prepare-time one.
    pub fn prepare(&self, item: &Item) -> SchemaResult<Item> {
        for name in &self.required {
            match item.get(name) {
                None | Some(Value::Null) => {
                    return Err(SchemaError::RequiredFieldMissing { field: name.clone() });
                }
                Some(_) => {}
            }
        }

        let mut prepared = Item::new();
        for (name, value) in item {
            let field = self
                .paths
                .get(name)
                .ok_or_else(|| SchemaError::UndeclaredField { field: name.clone() })?;
            prepared.insert(name.clone(), field.prep(value.clone())?);
        }
        Ok(prepared)
    }

    /// Decodes a stored document for the application: every key runs
    /// through its field's getter pipeline. Symmetric with `prepare`,
    /// including the undeclared-attribute error.
    pub fn present(&self, stored: &Item) -> SchemaResult<Item> {
        let mut presented = Item::new();
        for (name, value) in stored {
            let field = self
                .paths
                .get(name)
                .ok_or_else(|| SchemaError::UndeclaredField { field: name.clone() })?;
            presented.insert(name.clone(), field.apply_getters(value.clone()));
        }
        Ok(presented)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.order)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("indexes", &self.indexes)
            .finish()
    }
}

/// Ordered schema construction: fields compile in declaration order, which
/// fixes the order of the derived name lists.
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaBuilder {
    /// Declares a field
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let mut paths = HashMap::new();
        let mut order = Vec::new();
        let mut required = Vec::new();
        let mut unique = Vec::new();
        let mut indexes = Vec::new();

        for (name, spec) in self.fields {
            let field = spec.build(&name)?;

            if field.is_required() {
                required.push(name.clone());
            }
            if field.is_unique() {
                unique.push(name.clone());
            }
            if field.index().is_some() {
                indexes.push(name.clone());
            }

            order.push(name.clone());
            paths.insert(name, field);
        }

        Ok(Schema {
            paths,
            order,
            required,
            unique,
            indexes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::builder()
            .field("id", FieldSpec::string().required())
            .field("name", FieldSpec::string().required())
            .field("age", FieldSpec::number())
            .field("tags", FieldSpec::string_array())
            .build()
            .unwrap()
    }

    fn to_item(value: Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_derived_lists_preserve_declaration_order() {
        let schema = Schema::builder()
            .field("b", FieldSpec::string().required().unique())
            .field("a", FieldSpec::string().required().index())
            .build()
            .unwrap();

        assert_eq!(schema.required(), &["b".to_string(), "a".to_string()]);
        assert_eq!(schema.unique(), &["b".to_string()]);
        assert_eq!(schema.indexes(), &["a".to_string()]);
    }

    #[test]
    fn test_prepare_casts_present_fields() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1", "name": "Ada", "age": "36"}));

        let prepared = schema.prepare(&item).unwrap();
        assert_eq!(prepared["age"], json!(36));
        assert_eq!(prepared["name"], json!("Ada"));
    }

    #[test]
    fn test_prepare_missing_required_names_the_field() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1"}));

        let err = schema.prepare(&item).unwrap_err();
        assert_eq!(
            err,
            SchemaError::RequiredFieldMissing {
                field: "name".into()
            }
        );
    }

    #[test]
    fn test_prepare_null_required_is_missing() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1", "name": null}));

        let err = schema.prepare(&item).unwrap_err();
        assert!(matches!(err, SchemaError::RequiredFieldMissing { .. }));
    }

    #[test]
    fn test_prepare_rejects_undeclared_attribute() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1", "name": "Ada", "ghost": 1}));

        let err = schema.prepare(&item).unwrap_err();
        assert_eq!(err, SchemaError::UndeclaredField { field: "ghost".into() });
    }

    #[test]
    fn test_prepare_leaves_absent_optional_fields_absent() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1", "name": "Ada"}));

        let prepared = schema.prepare(&item).unwrap();
        assert!(!prepared.contains_key("age"));
        assert!(!prepared.contains_key("tags"));
    }

    #[test]
    fn test_prepare_does_not_mutate_input() {
        let schema = sample_schema();
        let item = to_item(json!({"id": "u1", "name": "Ada", "age": "36"}));
        let before = item.clone();

        let _ = schema.prepare(&item).unwrap();
        assert_eq!(item, before);
    }

    #[test]
    fn test_present_rejects_undeclared_attribute() {
        let schema = sample_schema();
        let stored = to_item(json!({"ghost": 1}));

        let err = schema.present(&stored).unwrap_err();
        assert_eq!(err, SchemaError::UndeclaredField { field: "ghost".into() });
    }

    #[test]
    fn test_force_required_is_idempotent() {
        let mut schema = sample_schema();
        schema.force_required("age");
        schema.force_required("age");

        assert_eq!(
            schema.required(),
            &["id".to_string(), "name".to_string(), "age".to_string()]
        );
    }
}
