//! Error types and result types for connector operations.
//!
//! Every fallible operation in the workspace returns [`ConnectorResult<T>`]. Backends
//! report their own failures as [`ConnectorError::Store`] so the connector can pass them
//! through unchanged.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the connector and its store backends.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The request failed a local precondition: an empty create payload, a missing
    /// or malformed identifier, or a malformed where clause.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The record targeted by an update does not exist.
    #[error("Entity {id} not found in kind {model}")]
    NotFound {
        /// The model (kind) that was searched.
        model: String,
        /// The identifier that was not found.
        id: String,
    },
    /// The filter uses a construct the store's query language cannot express,
    /// such as a disjunction or a non-equality operator.
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),
    /// The model has no definition in the schema registry.
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    /// An error returned by the underlying store, passed through with its detail.
    #[error("Store error: {0}")]
    Store(String),
    /// Conversion between BSON, JSON and typed values failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Invalid settings or a failure while constructing a backend.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

impl From<BsonError> for ConnectorError {
    fn from(err: BsonError) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ConnectorError {
    fn from(err: SerdeJsonError) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}
