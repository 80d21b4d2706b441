//! # Field Specifications
//!
//! The declaration surface for a single schema field: type plus the
//! optional knobs (`required`, `unique`, `default`, custom set/get/validate,
//! `index`/`projection`, `min`/`max`, `enum`, `lowercase`/`uppercase`).
//!
//! A `FieldSpec` is consumed at schema-construction time and compiled into
//! an immutable [`FieldType`].

use serde_json::Value;

use super::errors::SchemaResult;
use super::field::{FieldType, IndexSpec, Predicate, Producer, Projection, Transform};
use super::types::{apply_type_options, TypeName};

/// Declaration of one schema field.
pub struct FieldSpec {
    pub(crate) type_name: TypeName,
    pub(crate) required: bool,
    pub(crate) unique: bool,
    pub(crate) default_literal: Option<Value>,
    pub(crate) default_producer: Option<Producer>,
    pub(crate) setters: Vec<Transform>,
    pub(crate) getters: Vec<Transform>,
    pub(crate) validators: Vec<(Predicate, String)>,
    pub(crate) index: bool,
    pub(crate) projection: Option<Projection>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) enum_values: Option<Vec<String>>,
    pub(crate) lowercase: bool,
    pub(crate) uppercase: bool,
}

impl FieldSpec {
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            required: false,
            unique: false,
            default_literal: None,
            default_producer: None,
            setters: Vec::new(),
            getters: Vec::new(),
            validators: Vec::new(),
            index: false,
            projection: None,
            min: None,
            max: None,
            enum_values: None,
            lowercase: false,
            uppercase: false,
        }
    }

    // ==================
    // Shorthand constructors
    // ==================

    pub fn boolean() -> Self {
        Self::new(TypeName::Boolean)
    }

    pub fn date() -> Self {
        Self::new(TypeName::Date)
    }

    pub fn date_array() -> Self {
        Self::new(TypeName::DateArray)
    }

    pub fn number() -> Self {
        Self::new(TypeName::Number)
    }

    pub fn number_array() -> Self {
        Self::new(TypeName::NumberArray)
    }

    pub fn string() -> Self {
        Self::new(TypeName::String)
    }

    pub fn string_array() -> Self {
        Self::new(TypeName::StringArray)
    }

    pub fn object() -> Self {
        Self::new(TypeName::Object)
    }

    // ==================
    // Options
    // ==================

    /// Marks the field required: `Schema::prepare` rejects documents where
    /// it is absent.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field unique. Advisory bookkeeping only; the store offers
    /// no uniqueness primitive.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// A literal default, cast once at schema construction.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_literal = Some(value);
        self.default_producer = None;
        self
    }

    /// A producer default, invoked fresh per document. Use for
    /// non-constant defaults such as the current time.
    pub fn default_fn(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default_producer = Some(Box::new(f));
        self.default_literal = None;
        self
    }

    /// Appends a custom setter, run before the built-in ones and the cast.
    pub fn set(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.setters.push(Box::new(f));
        self
    }

    /// Appends a custom getter, run before the type's built-in getter.
    pub fn get(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.getters.push(Box::new(f));
        self
    }

    /// Registers a custom validator with its failure label.
    pub fn validate(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        label: impl Into<String>,
    ) -> Self {
        self.validators.push((Box::new(predicate), label.into()));
        self
    }

    /// Flags the field as queryable through its derived secondary index.
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Sets the secondary-index projection. Implies `index()`.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.index = true;
        self.projection = Some(projection);
        self
    }

    /// Lower bound for Number fields (validation label `"min"`).
    pub fn min(mut self, minimum: f64) -> Self {
        self.min = Some(minimum);
        self
    }

    /// Upper bound for Number fields (validation label `"max"`).
    pub fn max(mut self, maximum: f64) -> Self {
        self.max = Some(maximum);
        self
    }

    /// Membership set for String fields (validation label `"enum"`).
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Registers a lowercasing setter (String fields).
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Registers an uppercasing setter (String fields).
    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    /// Compiles this declaration into an immutable [`FieldType`].
    ///
    /// Caller-supplied setters/getters/validators are registered before
    /// the type's built-in ones, so they run first.
    pub(crate) fn build(mut self, path: &str) -> SchemaResult<FieldType> {
        let mut field = FieldType::new(path, self.type_name);

        if let Some(value) = self.default_literal.take() {
            field.default_literal(value);
        }
        if let Some(producer) = self.default_producer.take() {
            field.set_default(super::field::DefaultValue::Producer(producer));
        }

        for setter in self.setters.drain(..) {
            field.push_setter(setter);
        }
        for getter in self.getters.drain(..) {
            field.push_getter(getter);
        }
        for (predicate, label) in self.validators.drain(..) {
            field.push_validator(predicate, label);
        }

        if self.required {
            field.mark_required();
        }
        if self.unique {
            field.mark_unique();
        }
        if self.index {
            field.set_index(IndexSpec {
                projection: self.projection.clone(),
            });
        }

        apply_type_options(&mut field, &self);

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;
    use serde_json::json;

    #[test]
    fn test_string_rejects_empty_by_construction() {
        let field = FieldSpec::string().build("name").unwrap();
        let err = field.prep(json!("")).unwrap_err();
        match err {
            SchemaError::Validation { label, .. } => assert_eq!(label, "empty string"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_enum_membership() {
        let field = FieldSpec::string()
            .enum_values(["a", "b"])
            .build("kind")
            .unwrap();

        assert_eq!(field.prep(json!("a")).unwrap(), json!("a"));
        let err = field.prep(json!("c")).unwrap_err();
        match err {
            SchemaError::Validation { label, value, .. } => {
                assert_eq!(label, "enum");
                assert_eq!(value, json!("c"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lowercase_setter_runs_before_validators() {
        let field = FieldSpec::string()
            .lowercase()
            .enum_values(["ok"])
            .build("state")
            .unwrap();

        assert_eq!(field.prep(json!("OK")).unwrap(), json!("ok"));
    }

    #[test]
    fn test_number_min_and_max_are_independent_bounds() {
        let field = FieldSpec::number().min(0.0).max(10.0).build("n").unwrap();

        assert_eq!(field.prep(json!(5)).unwrap(), json!(5));

        let low = field.prep(json!(-1)).unwrap_err();
        match low {
            SchemaError::Validation { label, .. } => assert_eq!(label, "min"),
            other => panic!("unexpected error: {:?}", other),
        }

        // an over-maximum value must fail the max bound, not slip past a
        // re-registered min check
        let high = field.prep(json!(11)).unwrap_err();
        match high {
            SchemaError::Validation { label, .. } => assert_eq!(label, "max"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_custom_validator_runs_before_builtin() {
        let field = FieldSpec::string()
            .validate(|v| v.as_str().is_some_and(|s| s.len() <= 3), "short")
            .build("code")
            .unwrap();

        let err = field.prep(json!("toolong")).unwrap_err();
        match err {
            SchemaError::Validation { label, .. } => assert_eq!(label, "short"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_projection_implies_index() {
        let field = FieldSpec::string()
            .projection(Projection::KeysOnly)
            .build("status")
            .unwrap();
        assert_eq!(
            field.index().and_then(|i| i.projection.clone()),
            Some(Projection::KeysOnly)
        );
    }
}
