//! dynamap - a typed document mapper for hash/range-keyed wide-column stores
//!
//! Declare a schema of named, typed, validated fields, bind it to a table
//! name and key structure, and work with typed documents while the mapper
//! handles casting, defaults, validators, setter/getter pipelines, and
//! translation into the store's conditional-write and per-attribute
//! update vocabulary.
//!
//! ```no_run
//! use dynamap::model::{KeyDef, Model, Update};
//! use dynamap::schema::{FieldSpec, Schema};
//! use dynamap::store::MemoryStore;
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), dynamap::model::ModelError> {
//! let schema = Schema::builder()
//!     .field("id", FieldSpec::string())
//!     .field("ts", FieldSpec::number())
//!     .field("status", FieldSpec::string().default_value(json!("pending")).index())
//!     .build()?;
//!
//! let model = Model::new(
//!     "events",
//!     KeyDef::hash("id").with_range("ts"),
//!     schema,
//!     MemoryStore::new(),
//! )?;
//!
//! model.create_table().await?;
//!
//! let doc = model.new_document(json!({"id": "e1", "ts": 1}).as_object().unwrap().clone());
//! model.insert(&doc).await?;
//!
//! model
//!     .update(
//!         json!({"id": "e1", "ts": 1}).as_object().unwrap(),
//!         &Update::new().set("status", json!("done")),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod model;
pub mod schema;
pub mod store;
