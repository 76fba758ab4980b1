//! MongoDB backend for kindstore.
//!
//! Enable it through the `mongodb` feature of the facade crate:
//!
//! ```toml
//! [dependencies]
//! kindstore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! Kinds map to collections in the database named by the settings' project id. With a
//! namespace set, collection names are prefixed `{namespace}_{kind}`. Predicates are
//! translated to `$and` of `$eq` clauses, so the backend never sees anything the native
//! query cannot express.
//!
//! # Example
//!
//! ```ignore
//! use kindstore::{prelude::*, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConnectorSettings::from_path("kindstore.json")?;
//!     let connector = DatastoreConnector::connect(
//!         MongoDbStore::builder("mongodb://localhost:27017", &settings),
//!         &settings,
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kindstore_mongodb;

mod query;
mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
