//! Field-type engine and schema composition.
//!
//! A schema is an ordered set of named, typed fields. Each field carries a
//! caster (total, never fails), setter and getter pipelines, validators,
//! an optional default, and the required/unique/index flags.
//!
//! # Design principles
//!
//! - Casters are total on their declared domain; failures come only from
//!   validators
//! - Undeclared attributes are hard errors in both directions
//! - Construction once at model-definition time, immutable after
//! - Deterministic: documents iterate in sorted key order

mod errors;
mod field;
mod schema;
mod spec;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use field::{DefaultValue, FieldType, IndexSpec, Predicate, Producer, Projection, Transform};
pub use schema::{Item, Schema, SchemaBuilder};
pub use spec::FieldSpec;
pub use types::TypeName;
