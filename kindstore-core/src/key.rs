//! Store keys and identifier resolution.
//!
//! A record in the store is addressed by a [`StoreKey`]: the kind (model name) plus an
//! optional [`Identifier`]. A key without an identifier is *unbound*; the store assigns
//! one on the first write and hands back the bound key.

use std::fmt;

use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// The identifier component of a store key.
///
/// Stores assign numeric ids; callers may also supply string names. Numeric ids sort
/// before names, which is the order keys come back from a kind scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// A numeric id, as assigned by the store.
    Id(i64),
    /// A caller-chosen string name.
    Name(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "{id}"),
            Identifier::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Id(id)
    }
}

impl From<i32> for Identifier {
    fn from(id: i32) -> Self {
        Identifier::Id(i64::from(id))
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::Name(name)
    }
}

impl TryFrom<&Bson> for Identifier {
    type Error = ConnectorError;

    fn try_from(value: &Bson) -> ConnectorResult<Self> {
        match value {
            Bson::Int32(id) => Ok(Identifier::Id(i64::from(*id))),
            Bson::Int64(id) => Ok(Identifier::Id(*id)),
            Bson::String(name) if !name.is_empty() => Ok(Identifier::Name(name.clone())),
            other => Err(ConnectorError::Validation(format!(
                "identifier must be an integer or a non-empty string, got {other}"
            ))),
        }
    }
}

impl TryFrom<Bson> for Identifier {
    type Error = ConnectorError;

    fn try_from(value: Bson) -> ConnectorResult<Self> {
        Identifier::try_from(&value)
    }
}

// `Bson::from(&Identifier)` comes from bson's blanket `From<&T>` impl.
impl From<Identifier> for Bson {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::Id(id) => Bson::Int64(id),
            Identifier::Name(name) => Bson::String(name),
        }
    }
}

/// Address of a single record: a kind plus an identifier, once one is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    kind: String,
    id: Option<Identifier>,
}

impl StoreKey {
    /// The kind (model name) this key belongs to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifier, or `None` for an unbound key.
    pub fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    /// Whether the key carries an identifier.
    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }

    /// Returns a copy of this key bound to `id`.
    pub fn bind(&self, id: Identifier) -> StoreKey {
        StoreKey {
            kind: self.kind.clone(),
            id: Some(id),
        }
    }

    /// Consumes the key, returning its identifier.
    pub fn into_id(self) -> Option<Identifier> {
        self.id
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}({})", self.kind, id),
            None => write!(f, "{}(<unassigned>)", self.kind),
        }
    }
}

/// Builds store keys from model names and identifiers.
pub struct KeyResolver;

impl KeyResolver {
    /// Resolves a model and an optional identifier into a store key.
    ///
    /// Without an identifier the key is unbound: the store assigns one on the next
    /// write, and the caller must read it back from the returned key.
    pub fn resolve(model: &str, id: Option<Identifier>) -> StoreKey {
        StoreKey {
            kind: model.to_string(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_binds_the_given_identifier() {
        let key = KeyResolver::resolve("Note", Some(Identifier::from(7)));

        assert_eq!(key.kind(), "Note");
        assert_eq!(key.id(), Some(&Identifier::Id(7)));
        assert!(key.is_bound());
    }

    #[test]
    fn resolve_without_identifier_is_unbound() {
        let key = KeyResolver::resolve("Note", None);

        assert!(!key.is_bound());
        assert_eq!(key.bind(Identifier::from("a")).id(), Some(&Identifier::Name("a".into())));
    }

    #[test]
    fn identifiers_convert_from_bson() {
        assert_eq!(Identifier::try_from(&Bson::Int32(3)).unwrap(), Identifier::Id(3));
        assert_eq!(Identifier::try_from(&Bson::Int64(3)).unwrap(), Identifier::Id(3));
        assert_eq!(
            Identifier::try_from(&Bson::String("x".into())).unwrap(),
            Identifier::Name("x".into())
        );
        assert!(matches!(
            Identifier::try_from(&Bson::Null),
            Err(ConnectorError::Validation(_))
        ));
        assert!(matches!(
            Identifier::try_from(&Bson::Double(1.5)),
            Err(ConnectorError::Validation(_))
        ));
    }

    #[test]
    fn identifiers_convert_into_bson() {
        let id = Identifier::from(3);
        let name = Identifier::from("x");

        assert_eq!(Bson::from(&id), Bson::Int64(3));
        assert_eq!(Bson::from(name.clone()), Bson::String("x".into()));
        assert_eq!(Identifier::try_from(Bson::from(&name)).unwrap(), name);
    }

    #[test]
    fn numeric_ids_sort_before_names() {
        let mut ids = vec![Identifier::from("b"), Identifier::from(10), Identifier::from(2)];
        ids.sort();

        assert_eq!(ids, vec![Identifier::Id(2), Identifier::Id(10), Identifier::Name("b".into())]);
    }
}
