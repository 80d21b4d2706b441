//! # Document
//!
//! One logical record: a plain attribute map owned by the caller. A
//! document holds only its data; the model that created it owns the schema
//! and the store handle.

use serde_json::Value;

use crate::schema::{Item, Schema};

/// A per-record document instance.
///
/// Created through [`Model::new_document`](crate::model::Model::new_document),
/// which populates declared defaults for any field the caller did not
/// supply. Fields with no default and no supplied value remain absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    data: Item,
}

impl Document {
    /// Builds a document, filling in schema defaults for absent fields.
    /// Producer defaults are invoked fresh per call.
    pub(crate) fn with_defaults(schema: &Schema, mut data: Item) -> Self {
        for name in schema.field_names() {
            if data.contains_key(name) {
                continue;
            }
            if let Some(default) = schema.field(name).and_then(|f| f.default_value()) {
                data.insert(name.to_string(), default);
            }
        }
        Self { data }
    }

    pub fn data(&self) -> &Item {
        &self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.data.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    pub fn into_data(self) -> Item {
        self.data
    }
}

impl From<Document> for Item {
    fn from(doc: Document) -> Self {
        doc.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Schema};
    use serde_json::json;

    fn to_item(value: Value) -> Item {
        value.as_object().unwrap().clone()
    }

    fn schema_with_defaults() -> Schema {
        Schema::builder()
            .field("id", FieldSpec::string().required())
            .field(
                "status",
                FieldSpec::string().default_value(json!("pending")),
            )
            .field("note", FieldSpec::string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_absent_fields_only() {
        let schema = schema_with_defaults();
        let doc = Document::with_defaults(&schema, to_item(json!({"id": "x"})));

        assert_eq!(doc.get("status"), Some(&json!("pending")));
        // no default, not supplied: stays absent
        assert_eq!(doc.get("note"), None);
    }

    #[test]
    fn test_supplied_value_wins_over_default() {
        let schema = schema_with_defaults();
        let doc = Document::with_defaults(&schema, to_item(json!({"id": "x", "status": "done"})));

        assert_eq!(doc.get("status"), Some(&json!("done")));
    }

    #[test]
    fn test_producer_default_fresh_per_document() {
        use std::sync::atomic::{AtomicI64, Ordering};
        use std::sync::Arc;

        let counter = Arc::new(AtomicI64::new(0));
        let c = Arc::clone(&counter);
        let schema = Schema::builder()
            .field("id", FieldSpec::string().required())
            .field(
                "seq",
                FieldSpec::number().default_fn(move || json!(c.fetch_add(1, Ordering::SeqCst))),
            )
            .build()
            .unwrap();

        let first = Document::with_defaults(&schema, to_item(json!({"id": "a"})));
        let second = Document::with_defaults(&schema, to_item(json!({"id": "b"})));
        assert_eq!(first.get("seq"), Some(&json!(0)));
        assert_eq!(second.get("seq"), Some(&json!(1)));
    }
}
