//! Document lifecycle: models, documents, update translation, and query
//! routing.
//!
//! A [`Model`] binds a schema to a table name, a key definition, and a
//! store handle. Documents are caller-owned data maps; the model owns the
//! schema and the store. Every operation performs at most one store call;
//! schema-level failures resolve locally and never reach the wire.

mod document;
mod errors;
mod model;
mod query;
mod update;

pub use document::Document;
pub use errors::{ModelError, ModelResult};
pub use model::{KeyDef, Model};
pub use update::Update;
