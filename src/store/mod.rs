//! # Store Boundary
//!
//! The abstract interface to the backing hash/range-keyed store, plus the
//! request/response payload types the mapper translates into.
//!
//! The mapper consumes this trait only: it issues exactly one store call
//! per operation, performs no retries, and relays store errors verbatim.
//! Conditional-check failures are the documented, recoverable way `insert`
//! signals "already exists" and `update` signals "precondition not met".

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{Item, Projection};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque store-side error: a code plus a message.
///
/// The mapper never interprets these beyond
/// [`is_conditional_check_failed`](StoreError::is_conditional_check_failed).
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("store error [{code}]: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// A conditional-write precondition did not hold
    pub fn conditional_check_failed(message: impl Into<String>) -> Self {
        Self::new("ConditionalCheckFailedException", message)
    }

    /// The named table does not exist
    pub fn table_not_found(table: &str) -> Self {
        Self::new(
            "ResourceNotFoundException",
            format!("table '{}' not found", table),
        )
    }

    /// The named table already exists
    pub fn table_exists(table: &str) -> Self {
        Self::new(
            "ResourceInUseException",
            format!("table '{}' already exists", table),
        )
    }

    /// The request payload was malformed for this store
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("ValidationException", message)
    }

    /// Whether this is the recoverable conditional-write failure
    pub fn is_conditional_check_failed(&self) -> bool {
        self.code == "ConditionalCheckFailedException"
    }
}

/// The store's scalar attribute kinds usable as key components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Number,
    String,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Number => "N",
            KeyKind::String => "S",
        }
    }
}

/// Primary-key structure of a table: hash component, optional range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    pub hash: (String, KeyKind),
    pub range: Option<(String, KeyKind)>,
}

/// A secondary-index descriptor derived from an indexed schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub key_field: String,
    pub key_kind: KeyKind,
    pub projection: Option<Projection>,
}

/// Provisioned throughput for table creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    pub read: u32,
    pub write: u32,
}

impl Default for Throughput {
    fn default() -> Self {
        Self { read: 2, write: 1 }
    }
}

/// A per-attribute existence/value precondition for conditional writes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expected {
    pub exists: bool,
    pub value: Option<Value>,
}

impl Expected {
    /// The attribute must not exist (insert semantics)
    pub fn absent() -> Self {
        Self {
            exists: false,
            value: None,
        }
    }

    /// The attribute must exist, optionally with this exact value
    pub fn present(value: Option<Value>) -> Self {
        Self {
            exists: true,
            value,
        }
    }
}

/// Conditional-write specification for `put_item`. Empty means an
/// unconditional upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    pub expected: BTreeMap<String, Expected>,
}

/// Options for `get_item`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub consistent_read: bool,
}

/// What `update_item` returns about the previous record state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnValues {
    #[default]
    None,
    AllOld,
}

/// Options for `update_item`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub return_values: ReturnValues,
}

/// Options for `query`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub index_name: Option<String>,
    pub limit: Option<usize>,
    pub consistent_read: bool,
    pub scan_index_forward: Option<bool>,
    pub exclusive_start_key: Option<Item>,
}

/// The store's per-attribute update vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Put,
    Add,
    Del,
}

/// One attribute action inside an `update_item` request
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAction {
    pub action: ActionKind,
    pub value: Option<Value>,
}

impl AttributeAction {
    pub fn put(value: Value) -> Self {
        Self {
            action: ActionKind::Put,
            value: Some(value),
        }
    }

    pub fn add(value: Value) -> Self {
        Self {
            action: ActionKind::Add,
            value: Some(value),
        }
    }

    pub fn del() -> Self {
        Self {
            action: ActionKind::Del,
            value: None,
        }
    }
}

/// The ordered attribute-action list of an update request
pub type UpdateActions = BTreeMap<String, AttributeAction>;

/// Response to `put_item`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutResponse {
    pub consumed_capacity: Option<f64>,
}

/// Response to `update_item`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    /// Previous record state, when `ReturnValues::AllOld` was requested
    pub attributes: Option<Item>,
    pub consumed_capacity: Option<f64>,
}

/// Response to `query`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
    pub consumed_capacity: Option<f64>,
}

/// Description of a created table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    pub table_name: String,
    pub key_spec: KeySpec,
    pub secondary_indexes: Vec<SecondaryIndex>,
    pub throughput: Throughput,
}

/// The backing store, consumed through pre-translated payloads.
///
/// Implementations must be safe for concurrent use; the mapper adds no
/// synchronization of its own.
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes an item, honoring any conditional-write preconditions
    async fn put_item(
        &self,
        table: &str,
        item: Item,
        options: WriteOptions,
    ) -> StoreResult<PutResponse>;

    /// Reads a single item by primary key
    async fn get_item(
        &self,
        table: &str,
        key: Item,
        options: ReadOptions,
    ) -> StoreResult<Option<Item>>;

    /// Applies per-attribute actions to the item at the given key
    async fn update_item(
        &self,
        table: &str,
        key: Item,
        actions: UpdateActions,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResponse>;

    /// Queries by primary key or a named secondary index
    async fn query(
        &self,
        table: &str,
        conditions: Item,
        options: QueryOptions,
    ) -> StoreResult<QueryResponse>;

    /// Creates a table with the given key structure and indexes
    async fn create_table(
        &self,
        table: &str,
        key_spec: KeySpec,
        secondary_indexes: Vec<SecondaryIndex>,
        throughput: Throughput,
    ) -> StoreResult<TableDescription>;
}

#[async_trait]
impl<T: Store + ?Sized> Store for Arc<T> {
    async fn put_item(
        &self,
        table: &str,
        item: Item,
        options: WriteOptions,
    ) -> StoreResult<PutResponse> {
        (**self).put_item(table, item, options).await
    }

    async fn get_item(
        &self,
        table: &str,
        key: Item,
        options: ReadOptions,
    ) -> StoreResult<Option<Item>> {
        (**self).get_item(table, key, options).await
    }

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        actions: UpdateActions,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResponse> {
        (**self).update_item(table, key, actions, options).await
    }

    async fn query(
        &self,
        table: &str,
        conditions: Item,
        options: QueryOptions,
    ) -> StoreResult<QueryResponse> {
        (**self).query(table, conditions, options).await
    }

    async fn create_table(
        &self,
        table: &str,
        key_spec: KeySpec,
        secondary_indexes: Vec<SecondaryIndex>,
        throughput: Throughput,
    ) -> StoreResult<TableDescription> {
        (**self)
            .create_table(table, key_spec, secondary_indexes, throughput)
            .await
    }
}
