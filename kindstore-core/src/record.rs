//! Records, raw store entities, and the conversions between them.
//!
//! The store keeps the identifier in the key and only properties in the bag. ORM rows
//! carry the identifier as an ordinary field. [`ResultDecoder`] and [`MergePatcher`] move
//! the identifier across that boundary in each direction.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{ConnectorError, ConnectorResult},
    key::StoreKey,
};

/// An ORM row: property name to value, including the identifier field.
pub type Record = Document;

/// A record as the store holds it: a key plus a property bag without the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: StoreKey,
    pub properties: Document,
}

impl Entity {
    pub fn new(key: StoreKey, properties: Document) -> Self {
        Self { key, properties }
    }
}

/// Maps raw store entities back into ORM rows.
pub struct ResultDecoder;

impl ResultDecoder {
    /// Returns the entity's properties with the key's identifier set under `id_property`.
    ///
    /// A stray stored value under `id_property` is overwritten: the key is authoritative.
    pub fn decode(entity: Entity, id_property: &str) -> Record {
        let Entity { key, mut properties } = entity;

        if let Some(id) = key.into_id() {
            properties.insert(id_property, Bson::from(id));
        }

        properties
    }
}

/// Builds the full record written by an update.
pub struct MergePatcher;

impl MergePatcher {
    /// Overlays `incoming` onto `prior` and strips `id_property` from the result.
    ///
    /// Incoming values win on collision, except that two nested documents are merged
    /// field by field at every depth. Fields of `prior` that `incoming` does not mention
    /// are kept, in their original order; new fields are appended.
    pub fn merge(prior: Record, incoming: Document, id_property: &str) -> Document {
        let mut merged = Self::overlay(prior, incoming);

        merged.remove(id_property);
        merged
    }

    fn overlay(mut target: Document, incoming: Document) -> Document {
        for (field, value) in incoming {
            match value {
                Bson::Document(nested) if matches!(target.get(&field), Some(Bson::Document(_))) => {
                    if let Some(Bson::Document(prior)) = target.get_mut(&field) {
                        *prior = Self::overlay(std::mem::take(prior), nested);
                    }
                }
                value => {
                    target.insert(field, value);
                }
            }
        }

        target
    }
}

/// Serializes a typed value into a record.
pub fn to_record<T: Serialize>(value: &T) -> ConnectorResult<Record> {
    match serialize_to_bson(value)? {
        Bson::Document(record) => Ok(record),
        other => Err(ConnectorError::Serialization(format!(
            "expected a document, got {other}"
        ))),
    }
}

/// Deserializes a record into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> ConnectorResult<T> {
    Ok(deserialize_from_bson(Bson::Document(record))?)
}
