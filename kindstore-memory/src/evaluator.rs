//! Predicate evaluation for in-memory entities.
//!
//! Values are compared through [`Comparable`], which normalizes numeric BSON types so that
//! an `Int32` filter value matches an `Int64` stored value.

use std::collections::HashMap;

use bson::{Bson, datetime::DateTime};

use kindstore_core::{
    error::ConnectorError,
    key::StoreKey,
    native::{Predicate, PredicateVisitor},
    record::Entity,
};


/// Type-erased, comparable representation of BSON values.
///
/// All integers and floats are normalized to f64.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Binary, ObjectId and other values that only equal themselves.
    Opaque(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Opaque(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Opaque(a), Comparable::Opaque(b)) => a == b,
            _ => false,
        }
    }
}


/// Checks whether an entity satisfies native predicates.
pub(crate) struct EntityEvaluator<'a> {
    entity: &'a Entity,
}

impl<'a> EntityEvaluator<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        Self { entity }
    }

    /// Whether every predicate in `predicates` holds for the entity.
    pub fn matches_all<'p>(
        &mut self,
        predicates: impl IntoIterator<Item = &'p Predicate>,
    ) -> bool {
        predicates
            .into_iter()
            .all(|predicate| self.visit_predicate(predicate).unwrap_or(false))
    }
}

impl<'a> PredicateVisitor for EntityEvaluator<'a> {
    type Output = bool;
    type Error = ConnectorError;

    fn visit_key(&mut self, key: &StoreKey) -> Result<Self::Output, Self::Error> {
        Ok(&self.entity.key == key)
    }

    fn visit_property(&mut self, property: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        // Entities without the property never match, not even a null filter value.
        Ok(
            self.entity
                .properties
                .get(property)
                .is_some_and(|stored| Comparable::from(stored) == Comparable::from(value))
        )
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use kindstore_core::key::{Identifier, KeyResolver};

    use super::*;

    fn entity() -> Entity {
        Entity::new(
            KeyResolver::resolve("Note", Some(Identifier::Id(1))),
            doc! { "n": 3_i64, "s": "x", "tags": ["a", "b"], "none": Bson::Null },
        )
    }

    #[test]
    fn numbers_compare_across_representations() {
        let entity = entity();
        let mut evaluator = EntityEvaluator::new(&entity);

        assert!(evaluator.visit_property("n", &Bson::Int32(3)).unwrap());
        assert!(evaluator.visit_property("n", &Bson::Double(3.0)).unwrap());
        assert!(!evaluator.visit_property("n", &Bson::Int32(4)).unwrap());
    }

    #[test]
    fn missing_properties_never_match() {
        let entity = entity();
        let mut evaluator = EntityEvaluator::new(&entity);

        assert!(!evaluator.visit_property("missing", &Bson::Null).unwrap());
        assert!(evaluator.visit_property("none", &Bson::Null).unwrap());
    }

    #[test]
    fn all_predicates_must_hold() {
        let entity = entity();
        let own_key = KeyResolver::resolve("Note", Some(Identifier::Id(1)));
        let other_key = KeyResolver::resolve("Note", Some(Identifier::Id(2)));

        assert!(EntityEvaluator::new(&entity).matches_all(&[
            Predicate::Key(own_key),
            Predicate::Property { property: "s".into(), value: "x".into() },
        ]));
        assert!(!EntityEvaluator::new(&entity).matches_all(&[
            Predicate::Key(other_key),
            Predicate::Property { property: "s".into(), value: "x".into() },
        ]));
        assert!(EntityEvaluator::new(&entity).matches_all(&[]));
    }
}
