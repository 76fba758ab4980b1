//! Core of kindstore: an ORM connector for key-addressed document stores whose query
//! language offers only conjunctive equality filters and key lookups.
//!
//! This crate provides:
//!
//! - **Keys** ([`key`]) - Identifiers, store keys and the key resolver
//! - **Schemas** ([`schema`]) - Model definitions, the schema registry and payload projection
//! - **Filters** ([`query`]) - The ORM filter shape and its parsed expression tree
//! - **Native queries** ([`native`]) - What the store can execute: equality predicates and paging
//! - **Compilation** ([`compile`]) - Filter trees to native queries, rejecting disjunctions
//! - **Records** ([`record`]) - Raw entities, result decoding and merge-as-update
//! - **Store backend abstraction** ([`backend`]) - The store boundary implemented by backends
//! - **Connector** ([`connector`]) - The CRUD surface consumed by the host ORM
//! - **Configuration** ([`config`]) - Connector settings
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use kindstore::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let registry = ModelRegistry::new().register(ModelDefinition::new("Note", ["title", "status"]));
//! let connector = DatastoreConnector::new(InMemoryStore::new(), registry);
//!
//! let id = connector.create("Note", doc! { "title": "hello", "status": "open" }).await?;
//! let open = connector
//!     .find("Note", &Filter::builder().where_clause(doc! { "status": "open" }).build())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as kindstore_core;

pub mod backend;
pub mod compile;
pub mod config;
pub mod connector;
pub mod error;
pub mod key;
pub mod native;
pub mod query;
pub mod record;
pub mod schema;
