//! Compilation of ORM filters into native store queries.
//!
//! The store understands conjunctions of equality predicates and nothing else. The
//! compiler therefore:
//!
//! - turns `{ <id_property>: v }` into a key predicate,
//! - turns `{ field: v }` into a property predicate,
//! - flattens `and` combinators (at any depth) into the single conjunction,
//! - rejects `or` combinators and operator clauses with
//!   [`ConnectorError::UnsupportedQuery`].
//!
//! A rejected filter fails the whole request.

use bson::{Bson, Document};
use tracing::{debug, warn};

use crate::{
    error::{ConnectorError, ConnectorResult},
    key::{Identifier, KeyResolver},
    native::{NativeQuery, Predicate},
    query::{Expr, Filter, QueryVisitor},
    schema::ModelDefinition,
};

/// Compiles filters for one model.
pub struct FilterCompiler<'a> {
    model: &'a ModelDefinition,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(model: &'a ModelDefinition) -> Self {
        Self { model }
    }

    /// Compiles `filter` into a native query over the model's kind.
    ///
    /// `limit` and `offset` are carried over unchanged.
    pub fn compile(&mut self, filter: &Filter) -> ConnectorResult<NativeQuery> {
        let predicates = self.visit_expr(&filter.expr()?)?;
        let query = NativeQuery {
            kind: self.model.name.clone(),
            predicates,
            limit: filter.limit,
            offset: filter.offset,
        };

        debug!(model = %self.model.name, query = ?query, "compiled filter");

        Ok(query)
    }
}

impl<'a> QueryVisitor for FilterCompiler<'a> {
    type Output = Vec<Predicate>;
    type Error = ConnectorError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let mut predicates = Vec::with_capacity(exprs.len());

        for expr in exprs {
            predicates.extend(self.visit_expr(expr)?);
        }

        Ok(predicates)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        warn!(model = %self.model.name, clauses = exprs.len(), "rejecting unsupported `or` clause");

        Err(ConnectorError::UnsupportedQuery(format!(
            "`or` clauses cannot be expressed against kind {} (conjunctive equality filters only)",
            self.model.name
        )))
    }

    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        if field == self.model.id_property {
            let key = KeyResolver::resolve(&self.model.name, Some(Identifier::try_from(value)?));

            return Ok(vec![Predicate::Key(key)]);
        }

        Ok(vec![Predicate::Property {
            property: field.to_string(),
            value: value.clone(),
        }])
    }

    fn visit_operator(
        &mut self,
        field: &str,
        clause: &Document,
    ) -> Result<Self::Output, Self::Error> {
        warn!(model = %self.model.name, field, clause = %clause, "rejecting unsupported operator clause");

        Err(ConnectorError::UnsupportedQuery(format!(
            "operator clause {clause} on field `{field}` is not an equality filter"
        )))
    }
}
