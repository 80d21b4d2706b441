//! # Update Translation
//!
//! Converts a high-level update description into the store's per-attribute
//! action vocabulary:
//!
//! - plain `{field: value}` and `$set`/`$put` entries → PUT, value prepped
//! - `$inc`/`$add` entries → ADD, value prepped
//! - `$del` entries → DEL, no value
//!
//! Translation is atomic: every field is resolved against the schema
//! before any action is produced, so one bad field aborts the whole
//! operation. A field named by more than one group is a
//! [`ConflictingUpdate`](super::ModelError::ConflictingUpdate) error, not
//! a silent last-write-wins.

use serde_json::Value;

use crate::schema::{Schema, SchemaError};
use crate::store::{AttributeAction, UpdateActions};

use super::errors::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq)]
enum UpdateOp {
    Put(Value),
    Add(Value),
    Del,
}

/// A high-level update description, built either with the fluent methods
/// or parsed from a `$`-grouped map via [`Update::from_value`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    entries: Vec<(String, UpdateOp)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// PUT: assign the field (value goes through the field's full prep)
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.entries.push((field.into(), UpdateOp::Put(value)));
        self
    }

    /// ADD: numeric accumulation at the store
    pub fn inc(mut self, field: impl Into<String>, value: Value) -> Self {
        self.entries.push((field.into(), UpdateOp::Add(value)));
        self
    }

    /// DEL: remove the attribute
    pub fn del(mut self, field: impl Into<String>) -> Self {
        self.entries.push((field.into(), UpdateOp::Del));
        self
    }

    /// Parses the `$`-grouped update form:
    ///
    /// ```json
    /// { "status": "done", "$inc": { "count": 1 }, "$del": { "temp": null } }
    /// ```
    ///
    /// `$set`/`$put` and `$inc`/`$add` are synonym pairs. Top-level
    /// entries outside a group are plain assignments.
    pub fn from_value(value: &Value) -> ModelResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            ModelError::Schema(SchemaError::UndeclaredField {
                field: value.to_string(),
            })
        })?;

        let mut update = Update::new();
        for (key, entry) in map {
            match key.as_str() {
                "$set" | "$put" => {
                    for (field, v) in group_entries(key, entry)? {
                        update.entries.push((field, UpdateOp::Put(v.clone())));
                    }
                }
                "$inc" | "$add" => {
                    for (field, v) in group_entries(key, entry)? {
                        update.entries.push((field, UpdateOp::Add(v.clone())));
                    }
                }
                "$del" => {
                    for (field, _) in group_entries(key, entry)? {
                        update.entries.push((field, UpdateOp::Del));
                    }
                }
                _ => {
                    update
                        .entries
                        .push((key.clone(), UpdateOp::Put(entry.clone())));
                }
            }
        }
        Ok(update)
    }

    /// Translates into store actions, resolving every field against the
    /// schema first. PUT/ADD values run through the field's `prep`; DEL
    /// carries no value.
    pub(crate) fn translate(&self, schema: &Schema) -> ModelResult<UpdateActions> {
        let mut actions = UpdateActions::new();
        for (name, op) in &self.entries {
            let field = schema
                .field(name)
                .ok_or_else(|| SchemaError::UndeclaredField { field: name.clone() })?;

            let action = match op {
                UpdateOp::Put(value) => AttributeAction::put(field.prep(value.clone())?),
                UpdateOp::Add(value) => AttributeAction::add(field.prep(value.clone())?),
                UpdateOp::Del => AttributeAction::del(),
            };

            if actions.insert(name.clone(), action).is_some() {
                return Err(ModelError::ConflictingUpdate { field: name.clone() });
            }
        }
        Ok(actions)
    }
}

fn group_entries<'a>(
    group: &str,
    entry: &'a Value,
) -> ModelResult<impl Iterator<Item = (String, &'a Value)>> {
    let map = entry.as_object().ok_or_else(|| {
        ModelError::Schema(SchemaError::UndeclaredField {
            field: group.to_string(),
        })
    })?;
    Ok(map.iter().map(|(k, v)| (k.clone(), v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::store::ActionKind;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .field("id", FieldSpec::string().required())
            .field("count", FieldSpec::number())
            .field("status", FieldSpec::string())
            .field("temp", FieldSpec::string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_inc_translates_to_single_add() {
        let update = Update::from_value(&json!({"$inc": {"count": 1}})).unwrap();
        let actions = update.translate(&schema()).unwrap();

        assert_eq!(actions.len(), 1);
        let action = &actions["count"];
        assert_eq!(action.action, ActionKind::Add);
        assert_eq!(action.value, Some(json!(1)));
    }

    #[test]
    fn test_del_translates_without_value() {
        let update = Update::from_value(&json!({"$del": {"temp": null}})).unwrap();
        let actions = update.translate(&schema()).unwrap();

        let action = &actions["temp"];
        assert_eq!(action.action, ActionKind::Del);
        assert_eq!(action.value, None);
    }

    #[test]
    fn test_plain_and_set_group_are_put() {
        let update =
            Update::from_value(&json!({"status": "done", "$set": {"count": "5"}})).unwrap();
        let actions = update.translate(&schema()).unwrap();

        assert_eq!(actions["status"].action, ActionKind::Put);
        // value runs through prep, so the string casts to a number
        assert_eq!(actions["count"].value, Some(json!(5)));
    }

    #[test]
    fn test_synonym_groups() {
        let via_put = Update::from_value(&json!({"$put": {"status": "x"}})).unwrap();
        let via_set = Update::from_value(&json!({"$set": {"status": "x"}})).unwrap();
        assert_eq!(
            via_put.translate(&schema()).unwrap(),
            via_set.translate(&schema()).unwrap()
        );

        let via_add = Update::from_value(&json!({"$add": {"count": 2}})).unwrap();
        let via_inc = Update::from_value(&json!({"$inc": {"count": 2}})).unwrap();
        assert_eq!(
            via_add.translate(&schema()).unwrap(),
            via_inc.translate(&schema()).unwrap()
        );
    }

    #[test]
    fn test_undeclared_field_aborts_whole_update() {
        let update =
            Update::from_value(&json!({"status": "done", "$inc": {"ghost": 1}})).unwrap();
        let err = update.translate(&schema()).unwrap_err();

        assert_eq!(
            err,
            ModelError::Schema(SchemaError::UndeclaredField {
                field: "ghost".into()
            })
        );
    }

    #[test]
    fn test_field_in_two_groups_conflicts() {
        let update =
            Update::from_value(&json!({"$set": {"count": 5}, "$inc": {"count": 1}})).unwrap();
        let err = update.translate(&schema()).unwrap_err();

        assert_eq!(err, ModelError::ConflictingUpdate { field: "count".into() });
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let built = Update::new()
            .set("status", json!("done"))
            .inc("count", json!(1))
            .del("temp");
        let parsed = Update::from_value(&json!({
            "status": "done",
            "$inc": {"count": 1},
            "$del": {"temp": null}
        }))
        .unwrap();

        assert_eq!(
            built.translate(&schema()).unwrap(),
            parsed.translate(&schema()).unwrap()
        );
    }
}
