//! Re-exports of the types most connector users need.
//!
//! ```ignore
//! use kindstore::prelude::*;
//! ```
//!
//! [`DynStoreBackend`](crate::backend::DynStoreBackend) is not re-exported: its methods
//! share names with [`StoreBackend`] and would make calls on concrete backends ambiguous.

pub use kindstore_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    config::ConnectorSettings,
    connector::{Connector, DatastoreConnector},
    error::{ConnectorError, ConnectorResult},
    key::{Identifier, KeyResolver, StoreKey},
    query::{Expr, Filter, FilterBuilder},
    record::{Record, from_record, to_record},
    schema::{ModelDefinition, ModelRegistry, SchemaRegistry},
};
