//! In-memory store backend for kindstore.
//!
//! [`InMemoryStore`] keeps entities in per-kind ordered maps behind an async-aware
//! read-write lock. It executes the same native queries a real key-addressed store would,
//! which makes it the backend of choice for development and tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use kindstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let registry = ModelRegistry::new().register(ModelDefinition::new("Note", ["title"]));
//!     let connector = DatastoreConnector::new(backend, registry);
//!
//!     let id = connector.create("Note", doc! { "title": "hello" }).await?;
//!     assert!(connector.find_by_id("Note", &id).await?.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kindstore_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
