//! # Memory Store
//!
//! An in-process [`Store`] implementation with full conditional-write,
//! update-action, and index-query semantics. Used by the integration
//! tests and as a reference for what the mapper expects of a backend.

use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use serde_json::Value;

use crate::schema::Item;

use super::{
    ActionKind, Expected, KeySpec, PutResponse, QueryOptions, QueryResponse, ReadOptions,
    ReturnValues, SecondaryIndex, Store, StoreError, StoreResult, TableDescription, Throughput,
    UpdateActions, UpdateOptions, UpdateResponse, WriteOptions,
};

struct Table {
    key_spec: KeySpec,
    secondary_indexes: Vec<SecondaryIndex>,
    throughput: Throughput,
    items: Vec<Item>,
}

/// In-memory store keyed by table name, safe for concurrent use.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently held by a table, if it exists
    pub async fn item_count(&self, table: &str) -> Option<usize> {
        let tables = self.tables.read().await;
        tables.get(table).map(|t| t.items.len())
    }

    /// The creation-time description of a table, if it exists
    pub async fn describe_table(&self, table: &str) -> Option<TableDescription> {
        let tables = self.tables.read().await;
        tables.get(table).map(|t| TableDescription {
            table_name: table.to_string(),
            key_spec: t.key_spec.clone(),
            secondary_indexes: t.secondary_indexes.clone(),
            throughput: t.throughput,
        })
    }
}

/// The (hash, range) primary-key values of an item, per the table's spec
fn primary_key(spec: &KeySpec, item: &Item) -> StoreResult<(Value, Option<Value>)> {
    let hash = item
        .get(&spec.hash.0)
        .cloned()
        .ok_or_else(|| StoreError::validation(format!("missing hash attribute '{}'", spec.hash.0)))?;

    let range = match &spec.range {
        Some((name, _)) => Some(item.get(name).cloned().ok_or_else(|| {
            StoreError::validation(format!("missing range attribute '{}'", name))
        })?),
        None => None,
    };

    Ok((hash, range))
}

fn same_key(spec: &KeySpec, item: &Item, key: &(Value, Option<Value>)) -> bool {
    match primary_key(spec, item) {
        Ok(item_key) => item_key == *key,
        Err(_) => false,
    }
}

/// Checks per-attribute existence/value preconditions against the current
/// item state, if any.
fn check_expected(existing: Option<&Item>, expected: &std::collections::BTreeMap<String, Expected>) -> StoreResult<()> {
    for (field, condition) in expected {
        let actual = existing.and_then(|item| item.get(field));
        if condition.exists {
            match actual {
                None => {
                    return Err(StoreError::conditional_check_failed(format!(
                        "attribute '{}' does not exist",
                        field
                    )));
                }
                Some(value) => {
                    if let Some(expected_value) = &condition.value {
                        if value != expected_value {
                            return Err(StoreError::conditional_check_failed(format!(
                                "attribute '{}' value mismatch",
                                field
                            )));
                        }
                    }
                }
            }
        } else if actual.is_some() {
            return Err(StoreError::conditional_check_failed(format!(
                "attribute '{}' already exists",
                field
            )));
        }
    }
    Ok(())
}

/// Total-enough ordering over the scalar values usable as keys
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Evaluates one query condition against an item's attribute value.
///
/// A scalar condition means equality; an object condition carries a single
/// comparison operator keyed by name, e.g. `{"GT": 10}` or
/// `{"BETWEEN": [lo, hi]}`.
fn matches_condition(actual: Option<&Value>, condition: &Value) -> StoreResult<bool> {
    let Some(actual) = actual else {
        return Ok(false);
    };

    let Some(comparison) = condition.as_object() else {
        return Ok(actual == condition);
    };

    let mut entries = comparison.iter();
    let (operator, operand) = entries
        .next()
        .ok_or_else(|| StoreError::validation("empty comparison object"))?;
    if entries.next().is_some() {
        return Err(StoreError::validation(
            "comparison object must carry exactly one operator",
        ));
    }

    let result = match operator.as_str() {
        "EQ" => actual == operand,
        "NE" => actual != operand,
        "LT" => cmp_values(actual, operand) == Ordering::Less,
        "LE" => cmp_values(actual, operand) != Ordering::Greater,
        "GT" => cmp_values(actual, operand) == Ordering::Greater,
        "GE" => cmp_values(actual, operand) != Ordering::Less,
        "BETWEEN" => match operand.as_array() {
            Some(bounds) if bounds.len() == 2 => {
                cmp_values(actual, &bounds[0]) != Ordering::Less
                    && cmp_values(actual, &bounds[1]) != Ordering::Greater
            }
            _ => {
                return Err(StoreError::validation(
                    "BETWEEN operand must be a two-element array",
                ));
            }
        },
        "BEGINS_WITH" => match (actual.as_str(), operand.as_str()) {
            (Some(s), Some(prefix)) => s.starts_with(prefix),
            _ => false,
        },
        other => {
            return Err(StoreError::validation(format!(
                "unsupported comparison operator '{}'",
                other
            )));
        }
    };
    Ok(result)
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn put_item(
        &self,
        table: &str,
        item: Item,
        options: WriteOptions,
    ) -> StoreResult<PutResponse> {
        let mut tables = self.tables.write().await;
        let table_data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        let key = primary_key(&table_data.key_spec, &item)?;
        let position = table_data
            .items
            .iter()
            .position(|existing| same_key(&table_data.key_spec, existing, &key));

        let existing = position.map(|i| &table_data.items[i]);
        check_expected(existing, &options.expected)?;

        match position {
            Some(i) => table_data.items[i] = item,
            None => table_data.items.push(item),
        }
        Ok(PutResponse::default())
    }

    async fn get_item(
        &self,
        table: &str,
        key: Item,
        _options: ReadOptions,
    ) -> StoreResult<Option<Item>> {
        let tables = self.tables.read().await;
        let table_data = tables
            .get(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        let key = primary_key(&table_data.key_spec, &key)?;
        Ok(table_data
            .items
            .iter()
            .find(|item| same_key(&table_data.key_spec, item, &key))
            .cloned())
    }

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        actions: UpdateActions,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResponse> {
        let mut tables = self.tables.write().await;
        let table_data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        let key_names: Vec<String> = {
            let spec = &table_data.key_spec;
            std::iter::once(spec.hash.0.clone())
                .chain(spec.range.as_ref().map(|(name, _)| name.clone()))
                .collect()
        };
        for field in actions.keys() {
            if key_names.iter().any(|k| k == field) {
                return Err(StoreError::validation(format!(
                    "cannot update key attribute '{}'",
                    field
                )));
            }
        }

        let target = primary_key(&table_data.key_spec, &key)?;
        let position = table_data
            .items
            .iter()
            .position(|item| same_key(&table_data.key_spec, item, &target));

        let old = position.map(|i| table_data.items[i].clone());
        let index = match position {
            Some(i) => i,
            None => {
                // update on a missing record creates it from the key
                table_data.items.push(key);
                table_data.items.len() - 1
            }
        };
        let item = &mut table_data.items[index];

        for (field, action) in actions {
            match action.action {
                ActionKind::Put => {
                    let value = action.value.ok_or_else(|| {
                        StoreError::validation(format!("PUT on '{}' requires a value", field))
                    })?;
                    item.insert(field, value);
                }
                ActionKind::Add => {
                    let value = action.value.ok_or_else(|| {
                        StoreError::validation(format!("ADD on '{}' requires a value", field))
                    })?;
                    let increment = value.as_f64().ok_or_else(|| {
                        StoreError::validation(format!("ADD on '{}' requires a number", field))
                    })?;
                    let current = item.get(&field).and_then(Value::as_f64).unwrap_or(0.0);
                    let sum = current + increment;
                    let stored = if sum.fract() == 0.0 && sum.abs() < i64::MAX as f64 {
                        Value::from(sum as i64)
                    } else {
                        serde_json::Number::from_f64(sum)
                            .map(Value::Number)
                            .unwrap_or_else(|| Value::from(0))
                    };
                    item.insert(field, stored);
                }
                ActionKind::Del => {
                    item.remove(&field);
                }
            }
        }

        let attributes = match options.return_values {
            ReturnValues::AllOld => old,
            ReturnValues::None => None,
        };
        Ok(UpdateResponse {
            attributes,
            consumed_capacity: None,
        })
    }

    async fn query(
        &self,
        table: &str,
        conditions: Item,
        options: QueryOptions,
    ) -> StoreResult<QueryResponse> {
        let tables = self.tables.read().await;
        let table_data = tables
            .get(table)
            .ok_or_else(|| StoreError::table_not_found(table))?;

        // resolve the sort attribute: index key for index queries, range
        // key otherwise
        let sort_field = match &options.index_name {
            Some(name) => {
                let index = table_data
                    .secondary_indexes
                    .iter()
                    .find(|idx| &idx.name == name)
                    .ok_or_else(|| {
                        StoreError::validation(format!("unknown index '{}'", name))
                    })?;
                Some(index.key_field.clone())
            }
            None => table_data.key_spec.range.as_ref().map(|(name, _)| name.clone()),
        };

        let mut matched = Vec::new();
        for item in &table_data.items {
            let mut all = true;
            for (field, condition) in &conditions {
                if !matches_condition(item.get(field), condition)? {
                    all = false;
                    break;
                }
            }
            if all {
                matched.push(item.clone());
            }
        }

        if let Some(field) = &sort_field {
            matched.sort_by(|a, b| {
                match (a.get(field), b.get(field)) {
                    (Some(x), Some(y)) => cmp_values(x, y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
        }
        if options.scan_index_forward == Some(false) {
            matched.reverse();
        }

        if let Some(start_key) = &options.exclusive_start_key {
            let target = primary_key(&table_data.key_spec, start_key)?;
            if let Some(position) = matched
                .iter()
                .position(|item| same_key(&table_data.key_spec, item, &target))
            {
                matched.drain(..=position);
            }
        }

        let mut last_evaluated_key = None;
        if let Some(limit) = options.limit {
            if matched.len() > limit {
                matched.truncate(limit);
                if let Some(last) = matched.last() {
                    let mut key = Item::new();
                    let spec = &table_data.key_spec;
                    if let Some(v) = last.get(&spec.hash.0) {
                        key.insert(spec.hash.0.clone(), v.clone());
                    }
                    if let Some((name, _)) = &spec.range {
                        if let Some(v) = last.get(name) {
                            key.insert(name.clone(), v.clone());
                        }
                    }
                    last_evaluated_key = Some(key);
                }
            }
        }

        Ok(QueryResponse {
            items: matched,
            last_evaluated_key,
            consumed_capacity: None,
        })
    }

    async fn create_table(
        &self,
        table: &str,
        key_spec: KeySpec,
        secondary_indexes: Vec<SecondaryIndex>,
        throughput: Throughput,
    ) -> StoreResult<TableDescription> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Err(StoreError::table_exists(table));
        }

        let description = TableDescription {
            table_name: table.to_string(),
            key_spec: key_spec.clone(),
            secondary_indexes: secondary_indexes.clone(),
            throughput,
        };
        tables.insert(
            table.to_string(),
            Table {
                key_spec,
                secondary_indexes,
                throughput,
                items: Vec::new(),
            },
        );
        Ok(description)
    }
}
