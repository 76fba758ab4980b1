//! The store's native query: a kind, a conjunction of equality predicates, and paging.
//!
//! This is everything the underlying store can express. There is no disjunction and no
//! operator other than equality; a predicate either pins the key or pins one property.

use bson::Bson;

use crate::{error::ConnectorError, key::StoreKey};

/// A single equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The record key equals this key.
    Key(StoreKey),
    /// The named property equals this value.
    Property {
        property: String,
        value: Bson,
    },
}

impl Predicate {
    /// Returns the key if this is a key predicate.
    pub fn as_key(&self) -> Option<&StoreKey> {
        match self {
            Predicate::Key(key) => Some(key),
            Predicate::Property { .. } => None,
        }
    }
}

/// A query against one kind. All predicates must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub kind: String,
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl NativeQuery {
    /// Creates an unfiltered query over `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            predicates: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Adds a predicate to the conjunction.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<usize>) -> Self {
        self.offset = offset;
        self
    }

    /// Returns the key predicates of this query.
    pub fn key_predicates(&self) -> impl Iterator<Item = &StoreKey> {
        self.predicates.iter().filter_map(Predicate::as_key)
    }
}

/// Walks native predicates. Backends implement this to evaluate or translate them.
pub trait PredicateVisitor {
    type Output;
    type Error: Into<ConnectorError>;

    fn visit_key(&mut self, key: &StoreKey) -> Result<Self::Output, Self::Error>;
    fn visit_property(&mut self, property: &str, value: &Bson) -> Result<Self::Output, Self::Error>;

    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<Self::Output, Self::Error> {
        match predicate {
            Predicate::Key(key) => self.visit_key(key),
            Predicate::Property { property, value } => self.visit_property(property, value),
        }
    }
}
