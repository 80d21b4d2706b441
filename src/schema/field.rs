//! # Field Type
//!
//! Per-field transformation unit: one caster plus ordered setter, getter,
//! and validator pipelines, a default value, and the required/unique/index
//! flags. Constructed once at schema-definition time and immutable after.
//!
//! Setters and getters are independent pipelines. A setter run always ends
//! with the cast; getters are whatever the type (or the caller) registered
//! to read the stored form back, casting is not undone automatically.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::TypeName;

/// A setter or getter pipeline stage
pub type Transform = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// A validator predicate; `false` fails the labelled validation
pub type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// A zero-argument default-value producer, invoked fresh per document
pub type Producer = Box<dyn Fn() -> Value + Send + Sync>;

/// A field default: either a literal (cast once at registration) or a
/// producer for non-constant defaults such as timestamps.
pub enum DefaultValue {
    Literal(Value),
    Producer(Producer),
}

impl DefaultValue {
    /// Materializes the default for a new document
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Literal(v) => v.clone(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

/// Attribute projection carried by a secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    /// Project every attribute into the index
    All,
    /// Project only the key attributes
    KeysOnly,
    /// Project the named attributes
    Include(Vec<String>),
}

/// Secondary-index declaration on a field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSpec {
    pub projection: Option<Projection>,
}

/// One schema field: caster, pipelines, validators, default, flags.
pub struct FieldType {
    path: String,
    type_name: TypeName,
    setters: Vec<Transform>,
    getters: Vec<Transform>,
    validators: Vec<(Predicate, String)>,
    default: Option<DefaultValue>,
    required: bool,
    unique: bool,
    index: Option<IndexSpec>,
}

impl FieldType {
    pub fn new(path: impl Into<String>, type_name: TypeName) -> Self {
        Self {
            path: path.into(),
            type_name,
            setters: Vec::new(),
            getters: Vec::new(),
            validators: Vec::new(),
            default: None,
            required: false,
            unique: false,
            index: None,
        }
    }

    // ==================
    // Construction-time builder calls
    // ==================

    /// Appends a setter to the pre-persistence pipeline
    pub fn set(&mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.setters.push(Box::new(f));
        self
    }

    /// Appends a getter to the post-retrieval pipeline
    pub fn get(&mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.getters.push(Box::new(f));
        self
    }

    /// Registers a (predicate, label) validator pair
    pub fn validate(
        &mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        label: impl Into<String>,
    ) -> &mut Self {
        self.validators.push((Box::new(predicate), label.into()));
        self
    }

    /// Registers a literal default, cast once at registration time
    pub fn default_literal(&mut self, value: Value) -> &mut Self {
        let cast = self.cast(&value);
        self.default = Some(DefaultValue::Literal(cast));
        self
    }

    /// Registers a producer default, invoked fresh per document
    pub fn default_producer(
        &mut self,
        f: impl Fn() -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.default = Some(DefaultValue::Producer(Box::new(f)));
        self
    }

    pub(crate) fn push_setter(&mut self, f: Transform) {
        self.setters.push(f);
    }

    pub(crate) fn push_getter(&mut self, f: Transform) {
        self.getters.push(f);
    }

    pub(crate) fn push_validator(&mut self, predicate: Predicate, label: String) {
        self.validators.push((predicate, label));
    }

    pub(crate) fn set_default(&mut self, default: DefaultValue) {
        self.default = Some(default);
    }

    pub(crate) fn mark_required(&mut self) {
        self.required = true;
    }

    pub(crate) fn mark_unique(&mut self) {
        self.unique = true;
    }

    pub(crate) fn set_index(&mut self, index: IndexSpec) {
        self.index = Some(index);
    }

    // ==================
    // Accessors
    // ==================

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn type_name(&self) -> TypeName {
        self.type_name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn index(&self) -> Option<&IndexSpec> {
        self.index.as_ref()
    }

    /// Materializes this field's default for a new document, if one was
    /// declared.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(DefaultValue::produce)
    }

    // ==================
    // Transformation entry points
    // ==================

    /// Casts a value to the stored representation. Total: never fails.
    pub fn cast(&self, value: &Value) -> Value {
        self.type_name.cast(value)
    }

    /// Folds the setters left-to-right, then casts.
    pub fn apply_setters(&self, value: Value) -> Value {
        let mut v = value;
        for setter in &self.setters {
            v = setter(v);
        }
        self.cast(&v)
    }

    /// Folds the getters left-to-right over the stored value.
    pub fn apply_getters(&self, stored: Value) -> Value {
        let mut v = stored;
        for getter in &self.getters {
            v = getter(v);
        }
        v
    }

    /// Runs validators in registration order; fails fast on the first
    /// rejecting predicate.
    pub fn do_validate(&self, value: &Value) -> SchemaResult<()> {
        for (predicate, label) in &self.validators {
            if !predicate(value) {
                return Err(SchemaError::Validation {
                    field: self.path.clone(),
                    label: label.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// The per-field entry point used by `Schema::prepare`: setters and
    /// cast, then validation over the stored value.
    pub fn prep(&self, value: Value) -> SchemaResult<Value> {
        let stored = self.apply_setters(value);
        self.do_validate(&stored)?;
        Ok(stored)
    }
}

impl std::fmt::Debug for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldType")
            .field("path", &self.path)
            .field("type", &self.type_name)
            .field("setters", &self.setters.len())
            .field("getters", &self.getters.len())
            .field("validators", &self.validators.len())
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("index", &self.index)
            .finish()
    }
}
