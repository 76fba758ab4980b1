//! kindstore: an ORM connector for key-addressed document stores.
//!
//! The host ORM speaks in models, filters with nested `and`/`or` clauses, and partial
//! updates. The store speaks in kinds, keys and conjunctive equality predicates. This crate
//! sits between the two: it resolves keys, projects payloads onto declared properties,
//! compiles filters into native queries and emulates updates as read-merge-write.
//!
//! # Features
//!
//! - **Key routing** - Filters on the identifier property become direct key lookups
//! - **Schema projection** - Undeclared properties never reach the store
//! - **Honest filtering** - Disjunctions and comparison operators are rejected, not ignored
//! - **Multiple backends** - In-memory and MongoDB stores behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use kindstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ConnectorError> {
//!     let registry = ModelRegistry::new()
//!         .register(ModelDefinition::new("Note", ["title", "status"]));
//!     let connector = DatastoreConnector::new(InMemoryStore::new(), registry);
//!
//!     let id = connector.create("Note", doc! { "title": "hello", "status": "open" }).await?;
//!     connector.update_attributes("Note", &id, doc! { "status": "done" }).await?;
//!
//!     let done = connector
//!         .find("Note", &Filter::builder().where_clause(doc! { "status": "done" }).build())
//!         .await?;
//!     assert_eq!(done.len(), 1);
//!
//!     connector.destroy_all("Note", &doc! { "id": id }).await?;
//!     assert_eq!(connector.count("Note", &doc! {}).await?, 0);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is chosen at runtime, box it as a [`DynStoreBackend`](backend::DynStoreBackend).
//! `Box<dyn DynStoreBackend>` implements [`StoreBackend`](backend::StoreBackend) itself, so
//! the connector accepts it like any other backend:
//!
//! ```ignore
//! use kindstore::{prelude::*, backend::DynStoreBackend, memory::InMemoryStore};
//!
//! let backend: Box<dyn DynStoreBackend> = Box::new(InMemoryStore::new());
//! let connector = DatastoreConnector::new(backend, registry);
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory store for development and testing
//! - [`mongodb`] - MongoDB store (requires the `mongodb` feature)

pub mod prelude;

pub use kindstore_core::{
    backend, compile, config, connector, error, key, native, query, record, schema,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory store backend.
pub mod memory {
    pub use kindstore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB store backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use kindstore_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
