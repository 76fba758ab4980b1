//! Translation of native queries into MongoDB filter documents.

use bson::{Bson, Document, doc};

use kindstore_core::{
    error::{ConnectorError, ConnectorResult},
    key::StoreKey,
    native::{NativeQuery, PredicateVisitor},
};

use crate::sanitizer::FieldSanitizer;

/// Field holding the entity identifier in every collection.
pub(crate) const ID_FIELD: &str = "_id";


/// Translates native predicates into MongoDB filter clauses.
///
/// Key predicates match on `_id`; property predicates become `$eq` clauses on the
/// sanitized field name. A query's predicates are joined with `$and`.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the filter document for `query`. An unfiltered query yields `{}`.
    pub(crate) fn translate(&mut self, query: &NativeQuery) -> ConnectorResult<Document> {
        if query.predicates.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": query
                .predicates
                .iter()
                .map(|predicate| self.visit_predicate(predicate))
                .collect::<ConnectorResult<Vec<_>>>()?,
        })
    }
}

impl PredicateVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = ConnectorError;

    fn visit_key(&mut self, key: &StoreKey) -> Result<Self::Output, Self::Error> {
        let id = key
            .id()
            .ok_or_else(|| ConnectorError::Store(format!("cannot filter on unbound key {key}")))?;

        Ok(doc! { ID_FIELD: Bson::from(id) })
    }

    fn visit_property(&mut self, property: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = FieldSanitizer::sanitize_name(property);

        Ok(doc! { field: { "$eq": value } })
    }
}

#[cfg(test)]
mod tests {
    use kindstore_core::{
        key::{Identifier, KeyResolver},
        native::Predicate,
    };

    use super::*;

    #[test]
    fn predicates_become_a_conjunction() {
        let query = NativeQuery::new("Note")
            .filter(Predicate::Key(KeyResolver::resolve("Note", Some(Identifier::Id(7)))))
            .filter(Predicate::Property { property: "meta.status".into(), value: "open".into() });

        assert_eq!(
            MongoQueryTranslator.translate(&query).unwrap(),
            doc! {
                "$and": [
                    { "_id": 7_i64 },
                    { "meta__dot__status": { "$eq": "open" } },
                ]
            }
        );
    }

    #[test]
    fn unfiltered_queries_match_everything() {
        assert_eq!(MongoQueryTranslator.translate(&NativeQuery::new("Note")).unwrap(), doc! {});
    }

    #[test]
    fn unbound_keys_cannot_be_translated() {
        let query = NativeQuery::new("Note").filter(Predicate::Key(KeyResolver::resolve("Note", None)));

        assert!(matches!(
            MongoQueryTranslator.translate(&query),
            Err(ConnectorError::Store(_))
        ));
    }
}
