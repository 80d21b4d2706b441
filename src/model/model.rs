//! # Model
//!
//! Binds a [`Schema`] to a table name, a key definition, and a [`Store`]
//! handle, and translates document-level operations into store requests.
//!
//! Every operation either resolves locally (a schema-level failure) or
//! forwards to exactly one store call and relays its result. The model is
//! stateless per call and safe to share across tasks.

use tracing::debug;

use crate::schema::{Item, Schema, SchemaError, TypeName};
use crate::store::{
    Expected, KeyKind, KeySpec, PutResponse, QueryOptions, ReadOptions, SecondaryIndex, Store,
    TableDescription, Throughput, UpdateOptions, UpdateResponse, WriteOptions,
};

use super::document::Document;
use super::errors::{ModelError, ModelResult};
use super::query;
use super::update::Update;

/// Primary-key declaration: hash field, optional range field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDef {
    pub hash: String,
    pub range: Option<String>,
}

impl KeyDef {
    pub fn hash(field: impl Into<String>) -> Self {
        Self {
            hash: field.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, field: impl Into<String>) -> Self {
        self.range = Some(field.into());
        self
    }
}

/// One named entity type: schema + key structure + store handle.
pub struct Model<S: Store> {
    name: String,
    table_prefix: Option<String>,
    hash_field: String,
    range_field: Option<String>,
    schema: Schema,
    store: S,
}

impl<S: Store> Model<S> {
    /// Binds a schema to a table name and key definition.
    ///
    /// The hash field (and range field, if declared) must exist in the
    /// schema; both are forced into the schema's required list.
    pub fn new(
        name: impl Into<String>,
        key: KeyDef,
        mut schema: Schema,
        store: S,
    ) -> ModelResult<Self> {
        let name = name.into();

        if schema.field(&key.hash).is_none() {
            return Err(ModelError::MissingHashField {
                model: name,
                field: key.hash,
            });
        }
        if let Some(range) = &key.range {
            if schema.field(range).is_none() {
                return Err(ModelError::MissingKeyField {
                    model: name,
                    field: range.clone(),
                });
            }
        }

        schema.force_required(&key.hash);
        if let Some(range) = &key.range {
            schema.force_required(range);
        }

        Ok(Self {
            name,
            table_prefix: None,
            hash_field: key.hash,
            range_field: key.range,
            schema,
            store,
        })
    }

    /// Prefixes every store call's table name, e.g. per-environment
    /// namespacing.
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hash_field(&self) -> &str {
        &self.hash_field
    }

    pub fn range_field(&self) -> Option<&str> {
        self.range_field.as_deref()
    }

    /// The table name used on the wire: prefix + model name
    pub fn table_name(&self) -> String {
        match &self.table_prefix {
            Some(prefix) => format!("{}{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Creates a document, populating declared defaults for any field the
    /// data does not supply.
    pub fn new_document(&self, data: Item) -> Document {
        Document::with_defaults(&self.schema, data)
    }

    /// Persists a document as an unconditional upsert.
    pub async fn save(&self, doc: &Document) -> ModelResult<PutResponse> {
        self.save_with(doc, WriteOptions::default()).await
    }

    /// Persists a document under the given conditional-write options.
    ///
    /// The document runs through `schema.prepare` first; a validation
    /// failure returns without contacting the store. The store response
    /// is relayed unmodified.
    pub async fn save_with(
        &self,
        doc: &Document,
        options: WriteOptions,
    ) -> ModelResult<PutResponse> {
        let prepared = self.schema.prepare(doc.data())?;

        let table = self.table_name();
        debug!(model = %self.name, table = %table, "put item");
        Ok(self.store.put_item(&table, prepared, options).await?)
    }

    /// Persists a document only if no record with its key exists.
    ///
    /// An existing record surfaces as the store's conditional-check
    /// failure; callers should treat that as recoverable.
    pub async fn insert(&self, doc: &Document) -> ModelResult<PutResponse> {
        let mut options = WriteOptions::default();
        options
            .expected
            .insert(self.hash_field.clone(), Expected::absent());
        if let Some(range) = &self.range_field {
            options.expected.insert(range.clone(), Expected::absent());
        }
        self.save_with(doc, options).await
    }

    /// Applies an update to the record identified by `conditions`.
    pub async fn update(&self, conditions: &Item, update: &Update) -> ModelResult<UpdateResponse> {
        self.update_with(conditions, update, UpdateOptions::default())
            .await
    }

    /// Applies an update under the given options.
    ///
    /// The whole update is resolved against the schema before any store
    /// request: one undeclared field, or a field named by two groups,
    /// aborts the operation.
    pub async fn update_with(
        &self,
        conditions: &Item,
        update: &Update,
        options: UpdateOptions,
    ) -> ModelResult<UpdateResponse> {
        let actions = update.translate(&self.schema)?;
        let key = self.key_from_conditions(conditions)?;

        let table = self.table_name();
        debug!(model = %self.name, table = %table, actions = actions.len(), "update item");
        Ok(self.store.update_item(&table, key, actions, options).await?)
    }

    /// Reads the record identified by `conditions`, decoding it through
    /// the schema's getter pipelines.
    pub async fn get(&self, conditions: &Item) -> ModelResult<Option<Item>> {
        self.get_with(conditions, ReadOptions::default()).await
    }

    pub async fn get_with(
        &self,
        conditions: &Item,
        options: ReadOptions,
    ) -> ModelResult<Option<Item>> {
        let key = self.key_from_conditions(conditions)?;

        let table = self.table_name();
        debug!(model = %self.name, table = %table, "get item");
        match self.store.get_item(&table, key, options).await? {
            Some(stored) => Ok(Some(self.schema.present(&stored)?)),
            None => Ok(None),
        }
    }

    /// Queries by primary key or, for conditions on non-key indexed
    /// fields, through the `<field>-index` secondary index.
    pub async fn query(&self, conditions: &Item) -> ModelResult<Vec<Item>> {
        self.query_with(conditions, QueryOptions::default()).await
    }

    pub async fn query_with(
        &self,
        conditions: &Item,
        mut options: QueryOptions,
    ) -> ModelResult<Vec<Item>> {
        let cast = query::route(
            &self.schema,
            &self.hash_field,
            self.range_field.as_deref(),
            conditions,
            &mut options,
        )?;

        let table = self.table_name();
        debug!(
            model = %self.name,
            table = %table,
            index = options.index_name.as_deref().unwrap_or("<primary>"),
            "query"
        );
        let response = self.store.query(&table, cast, options).await?;

        let mut items = Vec::with_capacity(response.items.len());
        for stored in &response.items {
            items.push(self.schema.present(stored)?);
        }
        Ok(items)
    }

    /// Creates the backing table: key descriptors derived from the
    /// schema's declared types, one secondary index per indexed field.
    pub async fn create_table(&self) -> ModelResult<TableDescription> {
        self.create_table_with(Throughput::default()).await
    }

    pub async fn create_table_with(&self, throughput: Throughput) -> ModelResult<TableDescription> {
        let hash_kind = self.key_kind(&self.hash_field)?;
        let range = match &self.range_field {
            Some(field) => Some((field.clone(), self.key_kind(field)?)),
            None => None,
        };
        let key_spec = KeySpec {
            hash: (self.hash_field.clone(), hash_kind),
            range,
        };

        let mut secondary_indexes = Vec::new();
        for field_name in self.schema.indexes() {
            let field = self.schema.field(field_name).ok_or_else(|| {
                SchemaError::UndeclaredField {
                    field: field_name.clone(),
                }
            })?;
            secondary_indexes.push(SecondaryIndex {
                name: query::index_name(field_name),
                key_field: field_name.clone(),
                key_kind: self.key_kind(field_name)?,
                projection: field.index().and_then(|i| i.projection.clone()),
            });
        }

        let table = self.table_name();
        debug!(model = %self.name, table = %table, indexes = secondary_indexes.len(), "create table");
        Ok(self
            .store
            .create_table(&table, key_spec, secondary_indexes, throughput)
            .await?)
    }

    /// Builds the store key mapping from `conditions`, casting each key
    /// field through its caster. Non-key condition entries do not
    /// participate in key construction.
    fn key_from_conditions(&self, conditions: &Item) -> ModelResult<Item> {
        let mut key = Item::new();
        for field_name in
            std::iter::once(&self.hash_field).chain(self.range_field.as_ref())
        {
            let field = self.schema.field(field_name).ok_or_else(|| {
                ModelError::MissingKeyField {
                    model: self.name.clone(),
                    field: field_name.clone(),
                }
            })?;
            let value = conditions.get(field_name).ok_or_else(|| {
                SchemaError::RequiredFieldMissing {
                    field: field_name.clone(),
                }
            })?;
            key.insert(field_name.clone(), field.cast(value));
        }
        Ok(key)
    }

    /// Maps a field's declared type to the store's key attribute kind.
    /// Array types cannot key a table or an index.
    fn key_kind(&self, field_name: &str) -> ModelResult<KeyKind> {
        let field = self
            .schema
            .field(field_name)
            .ok_or_else(|| ModelError::MissingHashField {
                model: self.name.clone(),
                field: field_name.to_string(),
            })?;

        match field.type_name() {
            TypeName::Boolean | TypeName::Date | TypeName::Number => Ok(KeyKind::Number),
            TypeName::String | TypeName::Object => Ok(KeyKind::String),
            array => Err(ModelError::UnsupportedKeyType {
                field: field_name.to_string(),
                type_name: array.as_str().to_string(),
            }),
        }
    }
}

impl<S: Store> std::fmt::Debug for Model<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("table", &self.table_name())
            .field("hash", &self.hash_field)
            .field("range", &self.range_field)
            .field("schema", &self.schema)
            .finish()
    }
}
